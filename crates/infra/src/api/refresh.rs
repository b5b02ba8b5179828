//! Single-flight token refresh coordination
//!
//! At most one refresh call is in flight per coordinator. Requests that
//! fail with 401 while a refresh is running park on a oneshot channel and
//! are woken, oldest first, when the refresh settles.
//!
//! The state lives in an explicit object rather than a global, so every
//! [`ApiClient`](super::ApiClient) (and every test) can own its own.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// How an in-flight refresh ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New access token to replay with
    Refreshed(String),
    /// Refresh failed; credentials were cleared
    Failed,
}

/// Coordinator state
#[derive(Debug, Default)]
enum RefreshState {
    #[default]
    Idle,
    Refreshing { waiters: VecDeque<oneshot::Sender<RefreshOutcome>> },
}

/// Result of [`RefreshCoordinator::join`]
#[derive(Debug)]
pub enum Join<'a> {
    /// The caller must perform the refresh and settle the guard
    Leader(RefreshGuard<'a>),
    /// A refresh is already running; await its outcome
    Waiter(oneshot::Receiver<RefreshOutcome>),
}

/// Owner of the `Idle`/`Refreshing` state machine
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    /// Coordinator in the `Idle` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the refresh window.
    ///
    /// From `Idle` the caller becomes the leader and the state moves to
    /// `Refreshing`. Otherwise the caller is queued behind the running
    /// refresh.
    pub fn join(&self) -> Join<'_> {
        let mut state = self.state.lock();
        match &mut *state {
            RefreshState::Idle => {
                *state = RefreshState::Refreshing { waiters: VecDeque::new() };
                debug!("token refresh started");
                Join::Leader(RefreshGuard { coordinator: self, settled: false })
            }
            RefreshState::Refreshing { waiters } => {
                let (tx, rx) = oneshot::channel();
                waiters.push_back(tx);
                debug!(position = waiters.len(), "queued behind in-flight token refresh");
                Join::Waiter(rx)
            }
        }
    }

    /// Whether a refresh is in flight
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.state.lock(), RefreshState::Refreshing { .. })
    }

    /// Requests parked behind the current refresh
    #[must_use]
    pub fn waiter_count(&self) -> usize {
        match &*self.state.lock() {
            RefreshState::Idle => 0,
            RefreshState::Refreshing { waiters } => waiters.len(),
        }
    }

    fn settle(&self, outcome: &RefreshOutcome) -> usize {
        let waiters = match std::mem::take(&mut *self.state.lock()) {
            RefreshState::Idle => VecDeque::new(),
            RefreshState::Refreshing { waiters } => waiters,
        };

        let count = waiters.len();
        for waiter in waiters {
            // A waiter whose request was dropped is simply skipped.
            let _ = waiter.send(outcome.clone());
        }
        count
    }
}

/// Proof of leadership over the in-flight refresh
///
/// Dropping the guard without settling (the leader's future was cancelled)
/// fails the refresh so queued requests are not stranded.
#[derive(Debug)]
#[must_use = "an unsettled refresh guard fails every waiter when dropped"]
pub struct RefreshGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl RefreshGuard<'_> {
    /// Wake every waiter in arrival order with `outcome` and return to
    /// `Idle`. Returns the number of waiters woken.
    pub fn settle(mut self, outcome: RefreshOutcome) -> usize {
        self.settled = true;
        self.coordinator.settle(&outcome)
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let woken = self.coordinator.settle(&RefreshOutcome::Failed);
            warn!(waiters = woken, "token refresh abandoned before settling");
        }
    }
}
