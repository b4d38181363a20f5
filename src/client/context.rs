// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Cancellation and deadline propagation.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::TxnError;

/// Carries cancellation and an optional deadline through every round trip
/// and backoff wait of a transaction.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derives a context that is cancelled with this one, or on its own via [`Context::cancel`].
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derives a child context that expires after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derives a child context that expires at `deadline` (or earlier if the
    /// parent's deadline comes first).
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) => parent.min(deadline),
            None => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Cancels this context and all contexts derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the reason the context is done, or `None` while it is live.
    pub fn err(&self) -> Option<TxnError> {
        if self.token.is_cancelled() {
            return Some(TxnError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(TxnError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> TxnError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => TxnError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => TxnError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                TxnError::Cancelled
            }
        }
    }

    /// Sleeps for `duration` unless the context finishes first.
    pub async fn sleep(&self, duration: Duration) -> Result<(), TxnError> {
        tokio::select! {
            biased;
            err = self.done() => Err(err),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_background_is_live() {
        let ctx = Context::background();
        assert!(ctx.err().is_none());
        assert!(ctx.deadline().is_none());
        assert!(ctx.sleep(Duration::from_millis(1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_propagates_to_children() {
        let parent = Context::background();
        let child = parent.child();

        parent.cancel();
        assert!(matches!(child.err(), Some(TxnError::Cancelled)));
        assert!(matches!(child.done().await, TxnError::Cancelled));
    }

    #[tokio::test]
    async fn test_child_cancel_does_not_affect_parent() {
        let parent = Context::background();
        let child = parent.child();

        child.cancel();
        assert!(parent.err().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_interrupts_sleep() {
        let ctx = Context::background().with_timeout(Duration::from_millis(10));
        let err = ctx.sleep(Duration::from_secs(60)).await.unwrap_err();
        assert!(matches!(err, TxnError::DeadlineExceeded));
        assert!(matches!(ctx.err(), Some(TxnError::DeadlineExceeded)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_deadline_capped_by_parent() {
        let parent = Context::background().with_timeout(Duration::from_millis(10));
        let child = parent.with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
    }
}
