//! Single-flight session refresh
//!
//! [`SessionRefreshCoordinator`] wraps one [`SessionRefresher`] and makes
//! sure at most one refresh runs per coordinator at any instant. Callers
//! arriving while a refresh is in flight join it and observe the same
//! outcome. The in-flight handle is cleared when the refresh settles, before
//! any waiter sees the result, so the next failure after that starts a new
//! refresh.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Why a session refresh did not succeed
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The refresh endpoint answered with a non-2xx status
    #[error("refresh rejected with status {status}")]
    Rejected {
        /// HTTP status returned by the endpoint
        status: u16,
    },

    /// The refresh request never produced a response
    #[error("refresh transport error: {0}")]
    Transport(String),

    /// The spawned refresh task panicked or was cancelled
    #[error("refresh task failed: {0}")]
    Task(String),

    /// `refresh` was polled outside a tokio runtime
    #[error("no tokio runtime to run the refresh on")]
    NoRuntime,
}

/// One bounded refresh attempt, with no internal retry
#[async_trait]
pub trait SessionRefresher: Send + Sync + 'static {
    /// Refresh the ambient session credential
    ///
    /// # Errors
    /// Returns [`RefreshError`] when the session could not be refreshed.
    async fn refresh_session(&self) -> Result<(), RefreshError>;
}

type InFlight = Shared<BoxFuture<'static, bool>>;
type Slot = Arc<Mutex<Option<InFlight>>>;

/// Clears the in-flight slot when dropped, which covers success, failure and
/// a panicking refresher alike.
struct ClearOnSettle(Slot);

impl Drop for ClearOnSettle {
    fn drop(&mut self) {
        self.0.lock().take();
    }
}

/// Deduplicates concurrent refresh attempts
///
/// Cloning is cheap and clones share the in-flight slot.
#[derive(Clone)]
pub struct SessionRefreshCoordinator {
    refresher: Arc<dyn SessionRefresher>,
    in_flight: Slot,
}

impl SessionRefreshCoordinator {
    /// Coordinator around `refresher` with nothing in flight
    pub fn new(refresher: Arc<dyn SessionRefresher>) -> Self {
        Self { refresher, in_flight: Arc::new(Mutex::new(None)) }
    }

    /// Refresh the session, joining an in-flight attempt if there is one
    ///
    /// Returns `true` on success. Failures are logged and reported as
    /// `false`; they never propagate as errors.
    ///
    /// The refresh runs on a task spawned onto the current tokio runtime, so
    /// it completes and clears its handle even if every caller is dropped.
    /// Polled outside a runtime it starts nothing and returns `false`.
    pub async fn refresh(&self) -> bool {
        let Ok(runtime) = Handle::try_current() else {
            warn!(error = %RefreshError::NoRuntime, "session refresh skipped");
            return false;
        };

        let in_flight = {
            let mut slot = self.in_flight.lock();
            match slot.as_ref() {
                Some(existing) => {
                    debug!("joining in-flight session refresh");
                    existing.clone()
                }
                None => {
                    let started = self.start(&runtime);
                    *slot = Some(started.clone());
                    started
                }
            }
        };

        in_flight.await
    }

    /// Whether a refresh is currently outstanding
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.lock().is_some()
    }

    // Called with the slot locked; the task's guard blocks on that lock until
    // the new handle is published.
    fn start(&self, runtime: &Handle) -> InFlight {
        debug!("starting session refresh");
        let refresher = Arc::clone(&self.refresher);
        let guard = ClearOnSettle(Arc::clone(&self.in_flight));

        let task = runtime.spawn(async move {
            let _guard = guard;
            match refresher.refresh_session().await {
                Ok(()) => {
                    debug!("session refresh succeeded");
                    true
                }
                Err(err) => {
                    warn!(error = %err, "session refresh failed");
                    false
                }
            }
        });

        async move {
            task.await.unwrap_or_else(|err| {
                warn!(error = %RefreshError::Task(err.to_string()), "session refresh task aborted");
                false
            })
        }
        .boxed()
        .shared()
    }
}

impl std::fmt::Debug for SessionRefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRefreshCoordinator")
            .field("refreshing", &self.is_refreshing())
            .finish_non_exhaustive()
    }
}
