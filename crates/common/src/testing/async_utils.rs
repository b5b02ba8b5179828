//! Async test utilities

use std::future::Future;
use std::time::Duration;

/// Poll `condition` every `interval` until it holds or `timeout` elapses.
///
/// Returns whether the condition was observed to hold. Each poll yields to
/// the runtime, so tasks spawned on a current-thread runtime make progress
/// between checks.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use kinderhub_common::testing::poll_until;
///
/// # async fn demo() {
/// let ready = poll_until(Duration::from_secs(1), Duration::from_millis(5), || async { true }).await;
/// assert!(ready);
/// # }
/// ```
pub async fn poll_until<F, Fut>(timeout: Duration, interval: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = tokio::time::Instant::now();

    while start.elapsed() < timeout {
        if condition().await {
            return true;
        }
        tokio::time::sleep(interval).await;
    }

    condition().await
}
