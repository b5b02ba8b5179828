//! Reference-counted progress indicator
//!
//! The HTTP pipeline calls `start()` before every attempt and `stop()`
//! after it, whatever the outcome. The indicator is active while at least
//! one attempt is pending.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Receiver of request start/stop signals
pub trait ProgressIndicator: Send + Sync {
    /// A request started.
    fn start(&self);
    /// A request settled.
    fn stop(&self);
}

/// Pending-work counter backing a global loading bar
#[derive(Debug, Default)]
pub struct LoadingBar {
    pending: AtomicUsize,
}

impl LoadingBar {
    /// Idle bar with no pending work.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests still in flight.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Whether any request is in flight.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.pending() > 0
    }

    /// Forget all pending work.
    pub fn reset(&self) {
        self.pending.store(0, Ordering::Release);
    }
}

impl ProgressIndicator for LoadingBar {
    fn start(&self) {
        self.pending.fetch_add(1, Ordering::AcqRel);
    }

    /// Saturates at zero, so an unmatched stop is harmless.
    fn stop(&self) {
        let _ = self
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| Some(n.saturating_sub(1)));
    }
}

/// Indicator that ignores every signal
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressIndicator for NoopProgress {
    fn start(&self) {}
    fn stop(&self) {}
}

impl<T: ProgressIndicator + ?Sized> ProgressIndicator for std::sync::Arc<T> {
    fn start(&self) {
        (**self).start();
    }

    fn stop(&self) {
        (**self).stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_counts_overlapping_requests() {
        let bar = LoadingBar::new();
        bar.start();
        bar.start();
        assert_eq!(bar.pending(), 2);

        bar.stop();
        assert!(bar.is_active());
        bar.stop();
        assert!(!bar.is_active());
    }

    #[test]
    fn test_stop_saturates_at_zero() {
        let bar = LoadingBar::new();
        bar.stop();
        bar.stop();
        assert_eq!(bar.pending(), 0);

        bar.start();
        assert_eq!(bar.pending(), 1);
    }

    #[test]
    fn test_reset() {
        let bar = LoadingBar::new();
        bar.start();
        bar.start();
        bar.reset();
        assert!(!bar.is_active());
    }

    #[test]
    fn test_concurrent_start_stop_balances() {
        let bar = Arc::new(LoadingBar::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let bar = Arc::clone(&bar);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        bar.start();
                        bar.stop();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(bar.pending(), 0);
    }
}
