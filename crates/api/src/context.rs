//! Per-call deadline and cancellation.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{ApiError, Result};

/// Carries the caller's deadline and cancellation signal into a single API call.
///
/// A context with neither set never interrupts the call. Contexts are cheap to clone
/// and the clones share the same cancellation token.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl CallContext {
    pub fn background() -> Self {
        Self::default()
    }

    /// A timeout too large to represent as an instant leaves the context without
    /// a deadline.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Fails if the context is already cancelled or past its deadline.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        if let Some(deadline) = self.deadline {
            if deadline <= Instant::now() {
                return Err(ApiError::DeadlineExceeded);
            }
        }

        Ok(())
    }

    /// Drives `operation` to completion unless the context is cancelled or its
    /// deadline elapses first, in which case the operation is dropped.
    pub async fn run<F, T>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;

        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => {
                debug!("Call cancelled by caller");
                Err(ApiError::Cancelled)
            }
            _ = expired => {
                debug!("Call deadline exceeded");
                Err(ApiError::DeadlineExceeded)
            }
            result = operation => result,
        }
    }
}
