//! Retry policies as plain values
//!
//! A [`RetryPolicy`] describes how many times a call may be repeated and how
//! long to wait in between. It does not run anything itself: callers ask it
//! for a [`RetryDecision`] after each failed attempt, which keeps the policy
//! testable apart from any transport.

use std::time::Duration;

use rand::Rng;

/// Multiplicative jitter applied to computed delays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Jitter {
    /// Use the computed delay as is.
    None,
    /// Scale the delay by a factor drawn uniformly from `[low, high]`.
    Proportional { low: f64, high: f64 },
}

impl Jitter {
    /// The ±20% band used by every remote call.
    pub const STANDARD: Self = Self::Proportional { low: 0.8, high: 1.2 };

    /// Draws a scale factor.
    pub fn sample(&self) -> f64 {
        match *self {
            Self::None => 1.0,
            Self::Proportional { low, high } if high > low => rand::thread_rng().gen_range(low..=high),
            Self::Proportional { low, .. } => low,
        }
    }
}

impl Default for Jitter {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    /// Wait for the given delay, then try again.
    RetryAfter(Duration),
    /// Give up and surface the error.
    Stop,
}

/// Exponential backoff with jitter and a bounded number of retries.
///
/// `wait = min(initial_backoff * backoff_factor^retry * jitter, max_backoff)`
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_factor: f64,
    pub jitter: Jitter,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(30), 2.0)
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff: Duration, max_backoff: Duration, backoff_factor: f64) -> Self {
        Self { max_retries, initial_backoff, max_backoff, backoff_factor, jitter: Jitter::STANDARD }
    }

    /// A policy that makes a single attempt.
    pub fn no_retry() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO, 1.0)
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (0-based) for a given jitter factor.
    pub fn delay_with_factor(&self, retry: u32, jitter_factor: f64) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = self.initial_backoff.as_secs_f64() * self.backoff_factor.powi(exponent) * jitter_factor;
        let capped = secs.min(self.max_backoff.as_secs_f64());
        Duration::try_from_secs_f64(capped).unwrap_or(self.max_backoff)
    }

    /// Delay before retry number `retry` (0-based) with sampled jitter.
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.delay_with_factor(retry, self.jitter.sample())
    }

    /// Decides what to do after `attempt` (1-based) failed.
    pub fn decide(&self, attempt: u32, retryable: bool) -> RetryDecision {
        if !retryable || attempt > self.max_retries {
            return RetryDecision::Stop;
        }
        RetryDecision::RetryAfter(self.delay_for(attempt - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_secs(1), Duration::from_secs(30), 2.0)
    }

    #[test]
    fn delays_grow_exponentially_until_capped() {
        let p = policy();
        assert_eq!(p.delay_with_factor(0, 1.0), Duration::from_secs(1));
        assert_eq!(p.delay_with_factor(1, 1.0), Duration::from_secs(2));
        assert_eq!(p.delay_with_factor(2, 1.0), Duration::from_secs(4));
        assert_eq!(p.delay_with_factor(10, 1.0), Duration::from_secs(30));
    }

    #[test]
    fn jitter_is_applied_before_the_cap() {
        let p = RetryPolicy::new(4, Duration::from_secs(2), Duration::from_secs(40), 2.0);
        assert_eq!(p.delay_with_factor(1, 1.2), Duration::from_secs_f64(4.8));
        assert_eq!(p.delay_with_factor(5, 1.2), Duration::from_secs(40));
    }

    #[test]
    fn sampled_delay_stays_in_jitter_band() {
        let p = policy();
        for _ in 0..200 {
            let delay = p.delay_for(2).as_secs_f64();
            assert!((3.2..=4.8).contains(&delay), "delay {delay} outside band");
        }
    }

    #[test]
    fn decide_stops_after_max_retries() {
        let p = policy().with_jitter(Jitter::None);
        assert_eq!(p.decide(1, true), RetryDecision::RetryAfter(Duration::from_secs(1)));
        assert_eq!(p.decide(3, true), RetryDecision::RetryAfter(Duration::from_secs(4)));
        assert_eq!(p.decide(4, true), RetryDecision::Stop);
        assert_eq!(p.max_attempts(), 4);
    }

    #[test]
    fn non_retryable_errors_stop_immediately() {
        assert_eq!(policy().decide(1, false), RetryDecision::Stop);
        assert_eq!(RetryPolicy::no_retry().decide(1, true), RetryDecision::Stop);
    }

    #[test]
    fn degenerate_jitter_band_uses_lower_bound() {
        let jitter = Jitter::Proportional { low: 1.0, high: 1.0 };
        assert!((jitter.sample() - 1.0).abs() < f64::EPSILON);
        assert!((Jitter::None.sample() - 1.0).abs() < f64::EPSILON);
    }
}
