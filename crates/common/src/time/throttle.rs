//! Randomized pauses between rate-limited operations

use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::millis;

/// Waits a random duration in `[min, max]` each time it is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    min: Duration,
    max: Duration,
}

impl Throttle {
    /// Builds a throttle; the bounds are swapped if given in reverse.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn fixed(delay: Duration) -> Self {
        Self::new(delay, delay)
    }

    /// A throttle that never waits.
    pub fn none() -> Self {
        Self::fixed(Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn is_disabled(&self) -> bool {
        self.max.is_zero()
    }

    /// Draws the next pause length.
    pub fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }

    /// Sleeps for one drawn pause and returns its length.
    pub async fn wait(&self) -> Duration {
        let delay = self.next_delay();
        if !delay.is_zero() {
            debug!(delay_ms = millis(delay), "throttling");
            tokio::time::sleep(delay).await;
        }
        delay
    }

    /// Like [`wait`](Self::wait), but returns `false` as soon as `cancel`
    /// fires instead of sleeping out the pause.
    pub async fn wait_or_cancel(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = self.wait() => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[test]
    fn delays_stay_within_bounds() {
        let throttle = Throttle::new(Duration::from_millis(10), Duration::from_millis(20));
        for _ in 0..200 {
            let delay = throttle.next_delay();
            assert!(delay >= Duration::from_millis(10) && delay <= Duration::from_millis(20));
        }
    }

    #[test]
    fn reversed_bounds_are_normalized() {
        let throttle = Throttle::new(Duration::from_secs(15), Duration::from_secs(10));
        assert_eq!(throttle.min(), Duration::from_secs(10));
        assert_eq!(throttle.max(), Duration::from_secs(15));
    }

    #[tokio::test]
    async fn disabled_throttle_returns_immediately() {
        let throttle = Throttle::none();
        assert!(throttle.is_disabled());
        assert_eq!(throttle.wait().await, Duration::ZERO);
    }

    #[tokio::test]
    async fn cancellation_cuts_the_pause_short() {
        let throttle = Throttle::fixed(Duration::from_secs(30));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let started = Instant::now();
        assert!(!throttle.wait_or_cancel(&cancel).await);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn completes_pause_without_cancellation() {
        let throttle = Throttle::fixed(Duration::from_millis(5));
        assert!(throttle.wait_or_cancel(&CancellationToken::new()).await);
    }
}
