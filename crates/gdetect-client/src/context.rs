//! Cancellation and deadline handling for client operations
//!
//! Every network operation takes a [`Context`]. The operation future is raced
//! against the context's cancellation token and deadline, so a cancelled or
//! expired context drops the in-flight request instead of waiting for it.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{GdetectError, Result};

/// Cancellation token plus optional deadline
///
/// Cloning a `Context` shares the same token: cancelling one clone cancels
/// all of them. Use [`Context::child`] to derive a context that can be
/// cancelled on its own without affecting the parent.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// Build a context driven by an existing cancellation token
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Return a copy whose deadline is at most `timeout` from now
    ///
    /// A timeout too large to be represented leaves the deadline unchanged.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.clone(),
        }
    }

    /// Return a copy whose deadline is at most `deadline`
    ///
    /// An earlier deadline already set on `self` is kept.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current <= deadline => current,
            _ => deadline,
        };
        Self {
            token: self.token.clone(),
            deadline: Some(deadline),
        }
    }

    /// Derive a context cancelled together with `self`, but cancellable alone
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel this context and every child derived from it
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the context has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The underlying cancellation token
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Drive `fut` to completion unless the context ends first.
    ///
    /// Cancellation yields [`GdetectError::Cancelled`], deadline expiry
    /// yields [`GdetectError::Timeout`]. In both cases `fut` is dropped.
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(GdetectError::Cancelled),
            _ = deadline => Err(GdetectError::Timeout),
            res = fut => res,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes() {
        let ctx = Context::background();
        let value = ctx.run(async { Ok(42) }).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let ctx = Context::background().with_timeout(Duration::from_millis(5));
        let res: Result<()> = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(res, Err(GdetectError::Timeout)));
    }

    #[tokio::test]
    async fn test_run_cancelled() {
        let ctx = Context::background();
        ctx.cancel();
        let res: Result<()> = ctx.run(async { Ok(()) }).await;
        assert!(matches!(res, Err(GdetectError::Cancelled)));
    }

    #[test]
    fn test_earlier_deadline_wins() {
        let now = Instant::now();
        let ctx = Context::background().with_deadline(now + Duration::from_secs(1));
        let narrowed = ctx.with_deadline(now + Duration::from_secs(10));
        assert_eq!(narrowed.deadline(), Some(now + Duration::from_secs(1)));
    }

    #[test]
    fn test_unrepresentable_timeout_keeps_deadline() {
        let ctx = Context::background().with_timeout(Duration::MAX);
        assert_eq!(ctx.deadline(), None);

        let now = Instant::now();
        let bounded = Context::background().with_deadline(now + Duration::from_secs(1));
        assert_eq!(
            bounded.with_timeout(Duration::MAX).deadline(),
            Some(now + Duration::from_secs(1))
        );
    }

    #[tokio::test]
    async fn test_run_with_unrepresentable_timeout() {
        let ctx = Context::background().with_timeout(Duration::MAX);
        let value = ctx.run(async { Ok("done") }).await.unwrap();
        assert_eq!(value, "done");
    }

    #[test]
    fn test_child_cancellation() {
        let parent = Context::background();
        let child = parent.child();
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());

        let child = parent.child();
        parent.cancel();
        assert!(child.is_cancelled());
    }
}
