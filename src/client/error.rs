// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Transaction client error types.

use crate::api::{ErrorDetail, ErrorKind, KvError, TxnStatus};

/// Errors returned by transaction operations and transactional closures.
#[derive(Debug, thiserror::Error)]
pub enum TxnError {
    #[error(transparent)]
    Kv(#[from] KvError),

    #[error("context cancelled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("transaction already finalized with status {0}")]
    Finalized(TxnStatus),

    #[error("transaction was rolled back")]
    RolledBack,

    #[error("sender returned {actual} responses for {expected} requests")]
    ResponseMismatch { expected: usize, actual: usize },

    #[error("{0}")]
    User(Box<dyn std::error::Error + Send + Sync>),
}

impl TxnError {
    /// The signal a closure returns to have its transaction restarted right away.
    pub fn retry(reason: impl Into<String>) -> Self {
        TxnError::Kv(KvError::new(ErrorDetail::TransactionRetry {
            reason: reason.into(),
        }))
    }

    /// Wraps an arbitrary application error.
    pub fn user(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        TxnError::User(err.into())
    }

    /// Classifies the error for the retry loop. Only store errors can be retryable.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TxnError::Kv(err) => err.kind(),
            _ => ErrorKind::Fatal,
        }
    }

    /// Returns true for cancellation and deadline errors.
    #[inline]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, TxnError::Cancelled | TxnError::DeadlineExceeded)
    }

    /// Returns the underlying store error, if any.
    pub fn as_kv(&self) -> Option<&KvError> {
        match self {
            TxnError::Kv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ErrorDetail> for TxnError {
    fn from(detail: ErrorDetail) -> Self {
        TxnError::Kv(detail.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_signal_is_restart() {
        let err = TxnError::retry("again");
        assert_eq!(err.kind(), ErrorKind::Restart);
        assert_eq!(err.to_string(), "retry txn: again");
    }

    #[test]
    fn test_non_store_errors_are_fatal() {
        assert_eq!(TxnError::user("boom").kind(), ErrorKind::Fatal);
        assert_eq!(TxnError::Cancelled.kind(), ErrorKind::Fatal);
        assert_eq!(
            TxnError::Finalized(TxnStatus::Committed).to_string(),
            "transaction already finalized with status COMMITTED"
        );
        assert!(TxnError::DeadlineExceeded.is_cancellation());
        assert!(!TxnError::RolledBack.is_cancellation());
    }

    #[test]
    fn test_as_kv() {
        let err = TxnError::from(ErrorDetail::TransactionAborted);
        assert_eq!(err.as_kv().map(KvError::kind), Some(ErrorKind::Aborted));
        assert!(TxnError::user("x").as_kv().is_none());
    }
}
