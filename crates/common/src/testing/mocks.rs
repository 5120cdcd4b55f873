//! Mock implementations of common traits

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::auth::{RefreshError, SessionRefresher};

/// Scripted [`SessionRefresher`] that counts its calls
///
/// # Examples
///
/// ```
/// use s3manager_common::testing::MockSessionRefresher;
///
/// let refresher = MockSessionRefresher::failing();
/// assert_eq!(refresher.calls(), 0);
/// refresher.set_outcome(true);
/// ```
#[derive(Debug)]
pub struct MockSessionRefresher {
    succeed: AtomicBool,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockSessionRefresher {
    /// Refresher whose every call succeeds
    #[must_use]
    pub fn succeeding() -> Self {
        Self::with_outcome(true)
    }

    /// Refresher whose every call is rejected with 401
    #[must_use]
    pub fn failing() -> Self {
        Self::with_outcome(false)
    }

    fn with_outcome(succeed: bool) -> Self {
        Self { succeed: AtomicBool::new(succeed), delay: Duration::ZERO, calls: AtomicUsize::new(0) }
    }

    /// Sleep for `delay` inside each call before answering
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Change the outcome of subsequent calls
    pub fn set_outcome(&self, succeed: bool) {
        self.succeed.store(succeed, Ordering::SeqCst);
    }

    /// Number of refreshes performed so far
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionRefresher for MockSessionRefresher {
    async fn refresh_session(&self) -> Result<(), RefreshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.succeed.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RefreshError::Rejected { status: 401 })
        }
    }
}
