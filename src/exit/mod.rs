// Exit module - the out-of-band channel that stops the monitor loop

mod listener;

pub use listener::TriggerServer;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Write-once exit flag shared between the trigger listener (writer) and
/// the monitor loop (reader)
///
/// Once tripped it stays tripped for the supervisor's lifetime; it is the
/// sole point of shared mutable state between the two control flows.
#[derive(Debug, Clone, Default)]
pub struct ExitFlag {
    inner: Arc<AtomicBool>,
}

impl ExitFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag. Returns true when this call tripped it, false when it
    /// was already set.
    pub fn trip(&self) -> bool {
        !self.inner.swap(true, Ordering::SeqCst)
    }

    pub fn is_tripped(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }

    /// Sleep for `total`, polling the flag every `slice` so an exit signal
    /// is honored mid-sleep rather than only between full cycles.
    ///
    /// Returns true when the sleep was cut short (or the flag was already
    /// set), false when the full duration elapsed untripped.
    pub async fn sleep_unless_tripped(&self, total: Duration, slice: Duration) -> bool {
        let slice = if slice.is_zero() { total } else { slice };
        let mut remaining = total;

        while !remaining.is_zero() {
            if self.is_tripped() {
                return true;
            }
            let step = remaining.min(slice);
            sleep(step).await;
            remaining -= step;
        }

        self.is_tripped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_trip_is_write_once() {
        let flag = ExitFlag::new();
        assert!(!flag.is_tripped());

        assert!(flag.trip(), "first trip should report setting the flag");
        assert!(flag.is_tripped());

        assert!(!flag.trip(), "repeated trips are no-ops");
        assert!(flag.is_tripped());
    }

    #[tokio::test]
    async fn test_concurrent_trips_set_once() {
        let flag = ExitFlag::new();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let flag = flag.clone();
            handles.push(tokio::spawn(async move { flag.trip() }));
        }

        let mut first_trips = 0;
        for handle in handles {
            if handle.await.unwrap() {
                first_trips += 1;
            }
        }

        assert_eq!(first_trips, 1, "exactly one caller wins the trip");
        assert!(flag.is_tripped());
    }

    #[tokio::test]
    async fn test_sleep_runs_to_completion_when_untripped() {
        let flag = ExitFlag::new();
        let start = Instant::now();
        let interrupted = flag
            .sleep_unless_tripped(Duration::from_millis(50), Duration::from_millis(10))
            .await;
        assert!(!interrupted);
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_sleep_interrupted_mid_way() {
        let flag = ExitFlag::new();
        let tripper = flag.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            tripper.trip();
        });

        let start = Instant::now();
        let interrupted = flag
            .sleep_unless_tripped(Duration::from_secs(10), Duration::from_millis(10))
            .await;
        assert!(interrupted);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_sleep_returns_immediately_when_already_tripped() {
        let flag = ExitFlag::new();
        flag.trip();

        let start = Instant::now();
        let interrupted = flag
            .sleep_unless_tripped(Duration::from_secs(10), Duration::from_millis(10))
            .await;
        assert!(interrupted);
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_zero_slice_falls_back_to_total() {
        let flag = ExitFlag::new();
        let interrupted = flag
            .sleep_unless_tripped(Duration::from_millis(10), Duration::ZERO)
            .await;
        assert!(!interrupted);
    }
}
