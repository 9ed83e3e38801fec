//! Escalating backoff for whole-page retries
//!
//! Page retries sit above the per-call retries and wait considerably longer:
//! `2 * 2^n` units for the first two retries, then `5 * 3^(n-2)`, scaled by
//! jitter and capped.

use std::time::Duration;

use super::retry::Jitter;

#[derive(Debug, Clone, PartialEq)]
pub struct PageBackoff {
    /// Length of one schedule unit (one second in production).
    pub unit: Duration,
    pub cap: Duration,
    pub jitter: Jitter,
}

impl Default for PageBackoff {
    fn default() -> Self {
        Self { unit: Duration::from_secs(1), cap: Duration::from_secs(180), jitter: Jitter::STANDARD }
    }
}

impl PageBackoff {
    pub fn new(unit: Duration, cap: Duration) -> Self {
        Self { unit, cap, jitter: Jitter::STANDARD }
    }

    /// Schedule units before page retry `retry` (1-based).
    pub fn units(retry: u32) -> f64 {
        let n = i32::try_from(retry).unwrap_or(i32::MAX);
        if retry < 3 {
            2.0 * 2f64.powi(n)
        } else {
            5.0 * 3f64.powi(n - 2)
        }
    }

    pub fn delay_with_factor(&self, retry: u32, jitter_factor: f64) -> Duration {
        let secs = Self::units(retry) * self.unit.as_secs_f64() * jitter_factor;
        Duration::try_from_secs_f64(secs.min(self.cap.as_secs_f64())).unwrap_or(self.cap)
    }

    pub fn delay_for(&self, retry: u32) -> Duration {
        self.delay_with_factor(retry, self.jitter.sample())
    }
}
