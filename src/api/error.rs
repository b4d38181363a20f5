// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Errors returned by the store.

use crate::time::Timestamp;

use super::transaction::{Transaction, TxnId};
use super::{Key, Value};

/// How the transaction coordinator reacts to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Retry under the same identity; timestamp and priority are ratcheted
    /// from the error's transaction record.
    Restart,
    /// Retry as a brand-new transaction after aborting the current one.
    AbortRetry,
    /// The store already aborted the transaction. Retry as a new transaction
    /// without sending an abort.
    Aborted,
    /// Not retryable; surfaced to the caller.
    Fatal,
}

impl ErrorKind {
    #[inline]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ErrorKind::Fatal)
    }
}

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorDetail {
    #[error(
        "read at time {read_ts} encountered previous write with future timestamp {existing_ts} within uncertainty interval"
    )]
    ReadWithinUncertaintyInterval {
        read_ts: Timestamp,
        existing_ts: Timestamp,
    },

    #[error("retry txn: {reason}")]
    TransactionRetry { reason: String },

    #[error("write too old: timestamp {timestamp} <= {existing_ts}")]
    WriteTooOld {
        timestamp: Timestamp,
        existing_ts: Timestamp,
    },

    #[error("failed to push transaction {pushee:?}")]
    TransactionPush { pushee: Option<TxnId> },

    #[error("txn aborted")]
    TransactionAborted,

    #[error("range {range_id} was not found")]
    RangeNotFound { range_id: u64 },

    #[error("key range {start}-{end} outside of bounds of range")]
    RangeKeyMismatch { start: Key, end: Key },

    #[error("txn status error: {0}")]
    TransactionStatus(String),

    #[error("unexpected value: {actual:?}")]
    ConditionFailed { actual: Option<Value> },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorDetail {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorDetail::ReadWithinUncertaintyInterval { .. }
            | ErrorDetail::TransactionRetry { .. }
            | ErrorDetail::WriteTooOld { .. } => ErrorKind::Restart,
            ErrorDetail::TransactionPush { .. } => ErrorKind::AbortRetry,
            ErrorDetail::TransactionAborted => ErrorKind::Aborted,
            ErrorDetail::RangeNotFound { .. }
            | ErrorDetail::RangeKeyMismatch { .. }
            | ErrorDetail::TransactionStatus(_)
            | ErrorDetail::ConditionFailed { .. }
            | ErrorDetail::InvalidRequest(_)
            | ErrorDetail::Internal(_) => ErrorKind::Fatal,
        }
    }
}

/// A store error, optionally carrying the transaction record as the store
/// last saw it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{detail}")]
pub struct KvError {
    detail: ErrorDetail,
    txn: Option<Transaction>,
}

impl KvError {
    pub fn new(detail: ErrorDetail) -> Self {
        Self { detail, txn: None }
    }

    /// Attaches the store's view of the transaction.
    pub fn with_txn(mut self, txn: Option<Transaction>) -> Self {
        self.txn = txn;
        self
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorDetail::InvalidRequest(msg.into()))
    }

    #[inline]
    pub fn detail(&self) -> &ErrorDetail {
        &self.detail
    }

    #[inline]
    pub fn txn(&self) -> Option<&Transaction> {
        self.txn.as_ref()
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.detail.kind()
    }
}

impl From<ErrorDetail> for KvError {
    fn from(detail: ErrorDetail) -> Self {
        Self::new(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let cases = [
            (
                ErrorDetail::ReadWithinUncertaintyInterval {
                    read_ts: Timestamp::new(1, 0),
                    existing_ts: Timestamp::new(2, 0),
                },
                ErrorKind::Restart,
            ),
            (
                ErrorDetail::TransactionRetry {
                    reason: "test".into(),
                },
                ErrorKind::Restart,
            ),
            (
                ErrorDetail::WriteTooOld {
                    timestamp: Timestamp::new(1, 0),
                    existing_ts: Timestamp::new(2, 0),
                },
                ErrorKind::Restart,
            ),
            (
                ErrorDetail::TransactionPush { pushee: None },
                ErrorKind::AbortRetry,
            ),
            (ErrorDetail::TransactionAborted, ErrorKind::Aborted),
            (ErrorDetail::RangeNotFound { range_id: 1 }, ErrorKind::Fatal),
            (
                ErrorDetail::RangeKeyMismatch {
                    start: "a".into(),
                    end: "b".into(),
                },
                ErrorKind::Fatal,
            ),
            (
                ErrorDetail::TransactionStatus("committed".into()),
                ErrorKind::Fatal,
            ),
            (
                ErrorDetail::ConditionFailed { actual: None },
                ErrorKind::Fatal,
            ),
        ];

        for (detail, kind) in cases {
            assert_eq!(detail.kind(), kind, "{detail}");
            assert_eq!(kind.is_retryable(), kind != ErrorKind::Fatal);
        }
    }

    #[test]
    fn test_carries_txn() {
        let mut txn = Transaction::default();
        txn.timestamp = Timestamp::new(5, 0);

        let err = KvError::from(ErrorDetail::TransactionAborted).with_txn(Some(txn.clone()));
        assert_eq!(err.txn(), Some(&txn));
        assert_eq!(err.to_string(), "txn aborted");
    }
}
