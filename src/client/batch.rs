// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Caller-built batches.

use crate::api::{BatchRequest, Key, Method, Request, Value};

/// Accumulates operations, in call order, to be sent as one round trip via
/// [`super::Txn::run`], [`super::Txn::commit_in_batch`] or [`super::Db::run`].
///
/// The batch is a plain container: it does not validate keys (that happens
/// when it is sent) and never sends itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    requests: Vec<Request>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an arbitrary request.
    pub fn add(&mut self, req: Request) -> &mut Self {
        self.requests.push(req);
        self
    }

    pub fn get(&mut self, key: impl Into<Key>) -> &mut Self {
        self.add(Request::Get { key: key.into() })
    }

    pub fn put(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> &mut Self {
        self.add(Request::Put {
            key: key.into(),
            value: value.into(),
        })
    }

    /// Conditional put: writes `value` only if the current value is `expected`.
    pub fn cput(
        &mut self,
        key: impl Into<Key>,
        value: impl Into<Value>,
        expected: Option<Value>,
    ) -> &mut Self {
        self.add(Request::ConditionalPut {
            key: key.into(),
            value: value.into(),
            expected,
        })
    }

    pub fn inc(&mut self, key: impl Into<Key>, increment: i64) -> &mut Self {
        self.add(Request::Increment {
            key: key.into(),
            increment,
        })
    }

    pub fn del(&mut self, key: impl Into<Key>) -> &mut Self {
        self.add(Request::Delete { key: key.into() })
    }

    /// Deletes every key in `[start, end)`.
    pub fn del_range(&mut self, start: impl Into<Key>, end: impl Into<Key>) -> &mut Self {
        self.add(Request::DeleteRange {
            start: start.into(),
            end: end.into(),
        })
    }

    /// Returns the accumulated methods, in call order.
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

    /// Returns true if the last request is an `EndTransaction`.
    pub fn has_end_transaction(&self) -> bool {
        matches!(self.requests.last(), Some(Request::EndTransaction { .. }))
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub(crate) fn into_request(self) -> BatchRequest {
        BatchRequest {
            requests: self.requests,
            ..BatchRequest::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_methods_in_call_order() {
        let mut b = Batch::new();
        b.get("a")
            .put("a", "b")
            .cput("a", "c", Some(Value::from("b")))
            .inc("n", 1)
            .del("a")
            .del_range("a", "z");

        assert_eq!(
            b.methods(),
            vec![
                Method::Get,
                Method::Put,
                Method::ConditionalPut,
                Method::Increment,
                Method::Delete,
                Method::DeleteRange,
            ]
        );
        assert_eq!(b.len(), 6);
        assert!(!b.has_end_transaction());
    }

    #[test]
    fn test_empty_batch() {
        let b = Batch::new();
        assert!(b.is_empty());
        assert!(b.methods().is_empty());
        assert!(b.into_request().is_empty());
    }

    #[test]
    fn test_add_does_not_validate() {
        let mut b = Batch::new();
        b.get("");
        assert_eq!(b.len(), 1);
        assert!(b.into_request().validate().is_err());
    }

    #[test]
    fn test_end_transaction_detection() {
        let mut b = Batch::new();
        b.put("a", "b").add(Request::EndTransaction { commit: true });
        assert!(b.has_end_transaction());
        assert_eq!(
            b.requests().last(),
            Some(&Request::EndTransaction { commit: true })
        );
    }
}
