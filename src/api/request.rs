// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Individual key-value requests and their responses.

use std::fmt;

use super::data::{Key, Value, MAX_KEY_SIZE, MAX_VALUE_SIZE};
use super::error::{ErrorDetail, KvError};

/// The kind of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    ConditionalPut,
    Increment,
    Delete,
    DeleteRange,
    BeginTransaction,
    EndTransaction,
}

impl Method {
    /// Returns true for methods that mutate user data.
    ///
    /// Begin/end markers are transaction control, not writes.
    #[inline]
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Method::Put
                | Method::ConditionalPut
                | Method::Increment
                | Method::Delete
                | Method::DeleteRange
        )
    }

    /// Returns true for the begin and end transaction markers.
    #[inline]
    pub fn is_txn_control(&self) -> bool {
        matches!(self, Method::BeginTransaction | Method::EndTransaction)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "Get",
            Method::Put => "Put",
            Method::ConditionalPut => "ConditionalPut",
            Method::Increment => "Increment",
            Method::Delete => "Delete",
            Method::DeleteRange => "DeleteRange",
            Method::BeginTransaction => "BeginTransaction",
            Method::EndTransaction => "EndTransaction",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single operation inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Get {
        key: Key,
    },
    Put {
        key: Key,
        value: Value,
    },
    /// Writes `value` only if the current value equals `expected`
    /// (`None` meaning the key must not exist).
    ConditionalPut {
        key: Key,
        value: Value,
        expected: Option<Value>,
    },
    Increment {
        key: Key,
        increment: i64,
    },
    Delete {
        key: Key,
    },
    /// Deletes every key in `[start, end)`.
    DeleteRange {
        start: Key,
        end: Key,
    },
    /// Opens a transaction's write set; anchored at the first written key.
    BeginTransaction {
        key: Key,
    },
    /// Commits (`commit = true`) or aborts the transaction.
    EndTransaction {
        commit: bool,
    },
}

impl Request {
    /// Returns the method of this request.
    pub fn method(&self) -> Method {
        match self {
            Request::Get { .. } => Method::Get,
            Request::Put { .. } => Method::Put,
            Request::ConditionalPut { .. } => Method::ConditionalPut,
            Request::Increment { .. } => Method::Increment,
            Request::Delete { .. } => Method::Delete,
            Request::DeleteRange { .. } => Method::DeleteRange,
            Request::BeginTransaction { .. } => Method::BeginTransaction,
            Request::EndTransaction { .. } => Method::EndTransaction,
        }
    }

    /// Returns the (start) key addressed by this request, if any.
    pub fn key(&self) -> Option<&Key> {
        match self {
            Request::Get { key }
            | Request::Put { key, .. }
            | Request::ConditionalPut { key, .. }
            | Request::Increment { key, .. }
            | Request::Delete { key }
            | Request::BeginTransaction { key } => Some(key),
            Request::DeleteRange { start, .. } => Some(start),
            Request::EndTransaction { .. } => None,
        }
    }

    /// Checks that the request is well formed.
    pub fn validate(&self) -> Result<(), KvError> {
        if let Some(key) = self.key() {
            if key.is_empty() {
                return Err(invalid(format!("{}: empty key", self.method())));
            }
            if key.len() > MAX_KEY_SIZE {
                return Err(invalid(format!(
                    "{}: key too large: {} > {}",
                    self.method(),
                    key.len(),
                    MAX_KEY_SIZE
                )));
            }
        }

        match self {
            Request::Put { value, .. } | Request::ConditionalPut { value, .. }
                if value.len() > MAX_VALUE_SIZE =>
            {
                Err(invalid(format!(
                    "{}: value too large: {} > {}",
                    self.method(),
                    value.len(),
                    MAX_VALUE_SIZE
                )))
            }
            Request::DeleteRange { start, end } if end <= start => Err(invalid(format!(
                "DeleteRange: end key {} must be greater than start key {}",
                end, start
            ))),
            _ => Ok(()),
        }
    }
}

fn invalid(msg: String) -> KvError {
    KvError::new(ErrorDetail::InvalidRequest(msg))
}

/// The response to a single request, positionally aligned with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Get { value: Option<Value> },
    Put,
    ConditionalPut,
    Increment { new_value: i64 },
    Delete,
    DeleteRange { num_deleted: u64 },
    BeginTransaction,
    EndTransaction { committed: bool },
}

impl Response {
    /// Returns an empty response of the kind answering `req`.
    pub fn empty_for(req: &Request) -> Self {
        match req {
            Request::Get { .. } => Response::Get { value: None },
            Request::Put { .. } => Response::Put,
            Request::ConditionalPut { .. } => Response::ConditionalPut,
            Request::Increment { increment, .. } => Response::Increment {
                new_value: *increment,
            },
            Request::Delete { .. } => Response::Delete,
            Request::DeleteRange { .. } => Response::DeleteRange { num_deleted: 0 },
            Request::BeginTransaction { .. } => Response::BeginTransaction,
            Request::EndTransaction { commit } => Response::EndTransaction { committed: *commit },
        }
    }

    /// Returns the method this response answers.
    pub fn method(&self) -> Method {
        match self {
            Response::Get { .. } => Method::Get,
            Response::Put => Method::Put,
            Response::ConditionalPut => Method::ConditionalPut,
            Response::Increment { .. } => Method::Increment,
            Response::Delete => Method::Delete,
            Response::DeleteRange { .. } => Method::DeleteRange,
            Response::BeginTransaction => Method::BeginTransaction,
            Response::EndTransaction { .. } => Method::EndTransaction,
        }
    }
}
