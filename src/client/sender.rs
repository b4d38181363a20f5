// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! The dispatch capability the client is built on.

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::{BatchRequest, BatchResponse, KvError};

use super::Context;

/// Sends a batch to the store.
///
/// Implementations may be shared by many concurrent transactions; each call
/// carries its own transaction record. On success the response holds exactly
/// one entry per request, in request order. An implementation may rewrite
/// the transaction record (assign an id, push the timestamp) and returns the
/// rewritten record in the response, or in the error for errors that
/// concern the transaction.
#[async_trait]
pub trait Sender: Send + Sync {
    async fn send(&self, ctx: &Context, ba: BatchRequest) -> Result<BatchResponse, KvError>;
}

#[async_trait]
impl<S: Sender + ?Sized> Sender for Arc<S> {
    async fn send(&self, ctx: &Context, ba: BatchRequest) -> Result<BatchResponse, KvError> {
        (**self).send(ctx, ba).await
    }
}

/// Adapts a synchronous function into a [`Sender`].
///
/// ```
/// use strontium_txn::client::{Sender, SenderFn};
///
/// let sender = SenderFn::new(|ba| Ok(ba.create_reply()));
/// # let _: &dyn Sender = &sender;
/// ```
pub struct SenderFn<F> {
    f: F,
}

impl<F> SenderFn<F>
where
    F: Fn(BatchRequest) -> Result<BatchResponse, KvError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Sender for SenderFn<F>
where
    F: Fn(BatchRequest) -> Result<BatchResponse, KvError> + Send + Sync,
{
    async fn send(&self, _ctx: &Context, ba: BatchRequest) -> Result<BatchResponse, KvError> {
        (self.f)(ba)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ErrorDetail, Request, Response};

    #[tokio::test]
    async fn test_sender_fn_passthrough() {
        let sender = SenderFn::new(|ba: BatchRequest| Ok(ba.create_reply()));
        let mut ba = BatchRequest::new();
        ba.add(Request::Get { key: "a".into() });

        let br = sender.send(&Context::background(), ba).await.unwrap();
        assert_eq!(br.responses, vec![Response::Get { value: None }]);
    }

    #[tokio::test]
    async fn test_arc_dyn_sender() {
        let sender: Arc<dyn Sender> = Arc::new(SenderFn::new(|_ba: BatchRequest| {
            Err(KvError::new(ErrorDetail::RangeNotFound { range_id: 7 }))
        }));

        let err = sender
            .send(&Context::background(), BatchRequest::new())
            .await
            .unwrap_err();
        assert_eq!(err.detail(), &ErrorDetail::RangeNotFound { range_id: 7 });
    }
}
