// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Composite requests: one round trip to the store.

use crate::time::Timestamp;

use super::error::KvError;
use super::request::{Method, Request, Response};
use super::transaction::Transaction;
use super::Key;

/// Header fields shared by every request in a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    /// Requested timestamp.
    pub timestamp: Timestamp,
    /// Snapshot of the transaction record; `None` for non-transactional calls.
    pub txn: Option<Transaction>,
    /// User priority hint of the owning client.
    pub user_priority: i32,
}

/// An ordered list of requests sent as one round trip.
///
/// If an `EndTransaction` is present it is the last request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchRequest {
    pub header: Header,
    pub requests: Vec<Request>,
}

impl BatchRequest {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a request.
    pub fn add(&mut self, req: Request) {
        self.requests.push(req);
    }

    /// Returns the methods of the contained requests, in order.
    pub fn methods(&self) -> Vec<Method> {
        self.requests.iter().map(Request::method).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Returns true if the batch contains a data mutation.
    pub fn is_write(&self) -> bool {
        self.requests.iter().any(|r| r.method().is_write())
    }

    /// Returns true if the batch carries a transaction record.
    #[inline]
    pub fn is_transactional(&self) -> bool {
        self.header.txn.is_some()
    }

    /// Returns the first request of the given method.
    pub fn get_arg(&self, method: Method) -> Option<&Request> {
        self.requests.iter().find(|r| r.method() == method)
    }

    /// Returns the commit flag of the trailing `EndTransaction`, if any.
    pub fn end_transaction(&self) -> Option<bool> {
        match self.requests.last() {
            Some(Request::EndTransaction { commit }) => Some(*commit),
            _ => None,
        }
    }

    /// Returns the index and key of the first mutating request.
    pub fn first_write(&self) -> Option<(usize, &Key)> {
        self.requests
            .iter()
            .enumerate()
            .find(|(_, r)| r.method().is_write())
            .and_then(|(i, r)| r.key().map(|k| (i, k)))
    }

    /// Validates every request and the placement of transaction markers.
    pub fn validate(&self) -> Result<(), KvError> {
        let last = self.requests.len().saturating_sub(1);
        for (i, req) in self.requests.iter().enumerate() {
            req.validate()?;
            if req.method() == Method::EndTransaction && i != last {
                return Err(KvError::invalid_request(
                    "EndTransaction must be the last request in a batch",
                ));
            }
        }
        Ok(())
    }

    /// Builds a default reply: the request's transaction record and one empty
    /// response per request.
    pub fn create_reply(&self) -> BatchResponse {
        BatchResponse {
            txn: self.header.txn.clone(),
            responses: self.requests.iter().map(Response::empty_for).collect(),
        }
    }
}

/// Reply to a [`BatchRequest`]. `responses[i]` answers `requests[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResponse {
    /// Transaction record as updated by the store.
    pub txn: Option<Transaction>,
    pub responses: Vec<Response>,
}

impl BatchResponse {
    #[inline]
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorDetail;

    fn put(key: &str) -> Request {
        Request::Put {
            key: key.into(),
            value: "v".into(),
        }
    }

    #[test]
    fn test_methods_in_order() {
        let mut ba = BatchRequest::new();
        ba.add(Request::Get { key: "a".into() });
        ba.add(put("b"));
        ba.add(Request::EndTransaction { commit: true });

        assert_eq!(
            ba.methods(),
            vec![Method::Get, Method::Put, Method::EndTransaction]
        );
        assert_eq!(ba.end_transaction(), Some(true));
        assert!(ba.is_write());
        assert_eq!(ba.first_write(), Some((1, &Key::from("b"))));
    }

    #[test]
    fn test_read_only_batch() {
        let mut ba = BatchRequest::new();
        ba.add(Request::Get { key: "a".into() });

        assert!(!ba.is_write());
        assert_eq!(ba.first_write(), None);
        assert_eq!(ba.end_transaction(), None);
        assert!(ba.get_arg(Method::Get).is_some());
        assert!(ba.get_arg(Method::Put).is_none());
    }

    #[test]
    fn test_end_transaction_must_be_last() {
        let mut ba = BatchRequest::new();
        ba.add(Request::EndTransaction { commit: true });
        ba.add(put("a"));

        let err = ba.validate().unwrap_err();
        assert!(matches!(err.detail(), ErrorDetail::InvalidRequest(_)));
    }

    #[test]
    fn test_create_reply_aligned() {
        let mut ba = BatchRequest::new();
        ba.header.txn = Some(Transaction::default());
        ba.add(put("a"));
        ba.add(Request::Get { key: "a".into() });

        let br = ba.create_reply();
        assert_eq!(br.len(), ba.len());
        assert_eq!(br.responses[0], Response::Put);
        assert_eq!(br.responses[1], Response::Get { value: None });
        assert_eq!(br.txn, ba.header.txn);
    }
}
