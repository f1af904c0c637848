//! Rate and concurrency gate shared by every branch of one traversal
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore
//! - A minimum interval between fetch starts (requests per second)

use crate::config::CrawlerConfig;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

/// Admission to start one fetch
///
/// The concurrency slot is held until this value is dropped.
pub struct FetchPermit {
    _permit: OwnedSemaphorePermit,
}

/// Scheduler gating fetch starts
///
/// The scheduler enforces two limits at once:
/// - At most `max_concurrent` fetches in flight
/// - At most `max_per_second` fetch starts per second
pub struct Scheduler {
    /// Semaphore for limiting concurrent fetches
    semaphore: Arc<Semaphore>,

    /// Minimum time between two fetch starts
    min_interval: Duration,

    /// When the most recent fetch was admitted
    last_start: Mutex<Option<Instant>>,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `max_concurrent` - Fetches allowed in flight at once (at least 1)
    /// * `max_per_second` - Fetch starts allowed per second; non-positive or
    ///   non-finite values disable the interval
    pub fn new(max_concurrent: usize, max_per_second: f64) -> Self {
        let min_interval = if max_per_second.is_finite() && max_per_second > 0.0 {
            Duration::try_from_secs_f64(1.0 / max_per_second).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };

        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            min_interval,
            last_start: Mutex::new(None),
        }
    }

    /// Creates a scheduler from the `[crawler]` configuration section
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.max_concurrent_requests as usize,
            config.max_requests_per_second,
        )
    }

    /// Waits until a fetch may start
    ///
    /// Acquires a concurrency slot first, then sleeps out whatever remains
    /// of the start interval.
    ///
    /// # Returns
    ///
    /// * `Some(FetchPermit)` - The fetch may start now
    /// * `None` - The scheduler has been closed
    pub async fn admit(&self) -> Option<FetchPermit> {
        let permit = self.semaphore.clone().acquire_owned().await.ok()?;

        // Held across the sleep so that starts are serialized
        let mut last_start = self.last_start.lock().await;
        let wait = time_until_next_start(*last_start, self.min_interval, Instant::now());
        if !wait.is_zero() {
            tracing::trace!("Rate limit: waiting {:?} before next fetch", wait);
            tokio::time::sleep(wait).await;
        }
        *last_start = Some(Instant::now());

        Some(FetchPermit { _permit: permit })
    }

    /// Returns the number of free concurrency slots
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Returns the minimum interval between fetch starts
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

/// Time left before the next fetch may start
pub fn time_until_next_start(
    last_start: Option<Instant>,
    min_interval: Duration,
    now: Instant,
) -> Duration {
    match last_start {
        Some(last) => match last.checked_add(min_interval) {
            Some(next) => next.saturating_duration_since(now),
            None => min_interval,
        },
        None => Duration::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_scheduler() {
        let scheduler = Scheduler::new(10, 5.0);

        assert_eq!(scheduler.available_permits(), 10);
        assert_eq!(scheduler.min_interval(), Duration::from_millis(200));
    }

    #[test]
    fn test_from_config() {
        let scheduler = Scheduler::from_config(&CrawlerConfig::default());

        assert_eq!(scheduler.available_permits(), 60);
        assert_eq!(scheduler.min_interval(), Duration::from_millis(200));
    }

    #[test]
    fn test_tiny_rate_saturates_interval() {
        let scheduler = Scheduler::new(1, 1e-30);
        assert_eq!(scheduler.min_interval(), Duration::MAX);
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let scheduler = Scheduler::new(0, 0.0);
        assert_eq!(scheduler.available_permits(), 1);
        assert_eq!(scheduler.min_interval(), Duration::ZERO);
    }

    #[test]
    fn test_time_until_next_start() {
        let now = Instant::now();
        let interval = Duration::from_millis(500);

        assert_eq!(time_until_next_start(None, interval, now), Duration::ZERO);
        assert_eq!(
            time_until_next_start(Some(now), interval, now),
            Duration::from_millis(500)
        );
        assert_eq!(
            time_until_next_start(Some(now), interval, now + Duration::from_secs(1)),
            Duration::ZERO
        );
        assert_eq!(
            time_until_next_start(Some(now), Duration::MAX, now),
            Duration::MAX
        );
    }

    #[tokio::test]
    async fn test_permit_holds_slot_until_dropped() {
        let scheduler = Scheduler::new(2, 1000.0);

        let first = scheduler.admit().await.unwrap();
        let second = scheduler.admit().await.unwrap();
        assert_eq!(scheduler.available_permits(), 0);

        drop(first);
        assert_eq!(scheduler.available_permits(), 1);
        drop(second);
        assert_eq!(scheduler.available_permits(), 2);
    }

    #[tokio::test]
    async fn test_admit_spaces_out_starts() {
        let scheduler = Scheduler::new(10, 20.0);
        let started = Instant::now();

        for _ in 0..3 {
            let _permit = scheduler.admit().await.unwrap();
        }

        // Three starts at 20/s need at least two 50ms gaps
        assert!(started.elapsed() >= Duration::from_millis(100));
    }
}
