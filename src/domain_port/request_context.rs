use crate::domain_port::StoreError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline of the inbound request an operation runs for.
#[derive(Debug, Clone)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        RequestContext {
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Child of `parent`: cancelled with it, and expiring `timeout` from now.
    pub fn with_timeout(parent: &CancellationToken, timeout: Duration) -> Self {
        RequestContext {
            cancel: parent.child_token(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Drive a store call, aborting it when the request is cancelled or its deadline passes.
    pub async fn run<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let guarded = async {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(StoreError::Cancelled),
                result = call => result,
            }
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, guarded)
                .await
                .unwrap_or(Err(StoreError::DeadlineExceeded)),
            None => guarded.await,
        }
    }
}
