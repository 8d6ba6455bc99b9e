//! Long-running operation poller
//!
//! Project creation and service enablement return an operation handle rather
//! than a result. [`OperationPoller`] re-fetches the handle at a fixed interval
//! until it finishes, fails, runs past its deadline or the run is cancelled.

use crate::error::{CloudError, Result};
use crate::model::Operation;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;

/// Interval between two operation fetches
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(400);

/// Where an operation is in its lifetime, as observed by the poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationPhase {
    /// Returned by the mutating call, not fetched yet
    Accepted,
    /// Fetched at least once, not done
    InProgress,
    Succeeded,
    Failed,
}

impl OperationPhase {
    fn observe(op: &Operation) -> Self {
        match (op.done, &op.error) {
            (_, Some(_)) => OperationPhase::Failed,
            (true, None) => OperationPhase::Succeeded,
            (false, None) => OperationPhase::InProgress,
        }
    }
}

impl std::fmt::Display for OperationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationPhase::Accepted => write!(f, "accepted"),
            OperationPhase::InProgress => write!(f, "in progress"),
            OperationPhase::Succeeded => write!(f, "done"),
            OperationPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Polls operation handles until completion
#[derive(Debug, Clone)]
pub struct OperationPoller {
    interval: Duration,
    cancel: CancellationToken,
}

impl OperationPoller {
    pub fn new(interval: Duration, cancel: CancellationToken) -> Self {
        Self { interval, cancel }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Wait for `initial` to finish.
    ///
    /// `fetch` is called with the operation name once per tick. A fetch error
    /// aborts the wait: it means the status is unknown, not that the operation
    /// is still running. `deadline` of `None` waits until cancelled.
    pub async fn wait_until_done<F, Fut>(
        &self,
        initial: Operation,
        deadline: Option<Duration>,
        mut fetch: F,
    ) -> Result<()>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<Operation>>,
    {
        if let Some(err) = initial.error {
            return Err(err.into());
        }
        if initial.done {
            tracing::debug!(operation = %initial.name, "Operation already done");
            return Ok(());
        }

        let name = initial.name;
        let expires_at = deadline.map(|d| Instant::now() + d);
        let mut phase = OperationPhase::Accepted;
        let mut polls = 0u32;

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(CloudError::Cancelled),
                _ = expired(expires_at) => return Err(timeout(&name, deadline)),
                _ = sleep(self.interval) => {}
            }

            let op = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(CloudError::Cancelled),
                _ = expired(expires_at) => return Err(timeout(&name, deadline)),
                fetched = fetch(name.clone()) => fetched?,
            };
            polls += 1;

            let observed = OperationPhase::observe(&op);
            if observed != phase {
                tracing::debug!(operation = %name, polls, from = %phase, to = %observed, "Operation phase changed");
                phase = observed;
            }

            match phase {
                OperationPhase::Failed => {
                    return Err(op.error.map(Into::into).unwrap_or(CloudError::RemoteOperation {
                        code: 0,
                        message: "operation failed without details".into(),
                    }));
                }
                OperationPhase::Succeeded => {
                    tracing::info!(operation = %name, polls, "Operation completed");
                    return Ok(());
                }
                OperationPhase::Accepted | OperationPhase::InProgress => {}
            }
        }
    }
}

impl Default for OperationPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, CancellationToken::new())
    }
}

async fn expired(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn timeout(name: &str, deadline: Option<Duration>) -> CloudError {
    CloudError::Timeout(format!(
        "operation {} not done after {:?}",
        name,
        deadline.unwrap_or_default()
    ))
}
