//! Deadline-bounded, cancellable execution context.
//!
//! Each job execution carries one [`ExecutionContext`]. The executor races
//! its work against [`ExecutionContext::done`], so either an explicit
//! cancellation or the deadline tears the invocation down promptly.

use crate::error::ScanError;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// Deadline used when `now + timeout` does not fit in an [`Instant`].
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Cancellation token plus deadline for one unit of work.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    token: CancellationToken,
    deadline: Instant,
}

impl ExecutionContext {
    /// Create a context observing `token` that expires `timeout` from now.
    ///
    /// Timeouts too large to represent saturate to a deadline decades away.
    #[must_use]
    pub fn new(token: CancellationToken, timeout: Duration) -> Self {
        let now = Instant::now();
        let deadline = now
            .checked_add(timeout)
            .unwrap_or_else(|| now + FAR_FUTURE);
        Self { token, deadline }
    }

    /// Create a standalone context that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(CancellationToken::new(), timeout)
    }

    /// The token cancelled when the work should stop.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Instant after which the work counts as timed out.
    #[must_use]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Why the context has ended, or `None` while it is still live.
    ///
    /// Cancellation is reported ahead of an expired deadline.
    #[must_use]
    pub fn err(&self) -> Option<ScanError> {
        if self.is_cancelled() {
            Some(canceled())
        } else if self.is_expired() {
            Some(timed_out())
        } else {
            None
        }
    }

    /// Resolve once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ScanError {
        tokio::select! {
            biased;
            () = self.token.cancelled() => canceled(),
            () = sleep_until(self.deadline) => timed_out(),
        }
    }
}

fn canceled() -> ScanError {
    ScanError::Canceled("scan was cancelled".to_string())
}

fn timed_out() -> ScanError {
    ScanError::Timeout("scan timed out".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_reports_timeout() {
        let ctx = ExecutionContext::with_timeout(Duration::from_secs(5));
        assert!(ctx.err().is_none());

        let err = ctx.done().await;
        assert!(matches!(err, ScanError::Timeout(_)));
        assert!(ctx.is_expired());
        assert!(matches!(ctx.err(), Some(ScanError::Timeout(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_reports_canceled() {
        let parent = CancellationToken::new();
        let ctx = ExecutionContext::new(parent.child_token(), Duration::from_secs(60));

        parent.cancel();
        let err = ctx.done().await;
        assert!(matches!(err, ScanError::Canceled(_)));
        assert!(ctx.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_timeout_saturates() {
        let ctx = ExecutionContext::with_timeout(Duration::from_secs(u64::MAX));
        assert!(ctx.deadline() > Instant::now() + Duration::from_secs(86_400 * 365));
        assert!(ctx.err().is_none());

        ctx.cancel();
        assert!(matches!(ctx.done().await, ScanError::Canceled(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_wins_over_expired_deadline() {
        let ctx = ExecutionContext::with_timeout(Duration::from_millis(10));
        tokio::time::advance(Duration::from_millis(20)).await;
        ctx.cancel();
        assert!(matches!(ctx.err(), Some(ScanError::Canceled(_))));
    }
}
