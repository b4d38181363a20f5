// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! The client handle.

use std::sync::Arc;

use tracing::debug;

use crate::api::{BatchRequest, BatchResponse, ErrorDetail, Key, KvError, Response, Value};
use crate::time::Timestamp;

use super::{Batch, Context, DbConfig, Sender, Txn, TxnError};

/// Entry point of the client: owns the sender and the configuration every
/// transaction it starts inherits.
///
/// Cloning is cheap; clones share the sender.
#[derive(Clone)]
pub struct Db {
    sender: Arc<dyn Sender>,
    config: DbConfig,
}

impl Db {
    /// Creates a client with the default configuration.
    pub fn new(sender: Arc<dyn Sender>) -> Self {
        Self::with_config(sender, DbConfig::default())
    }

    pub fn with_config(sender: Arc<dyn Sender>, config: DbConfig) -> Self {
        Self { sender, config }
    }

    #[inline]
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    #[inline]
    pub(crate) fn sender(&self) -> &Arc<dyn Sender> {
        &self.sender
    }

    /// Starts a transaction that the caller drives by hand.
    ///
    /// Nothing is sent until the first operation. The caller is responsible
    /// for calling [`Txn::commit`] or [`Txn::rollback`]; prefer
    /// [`Db::run_transaction`], which also retries.
    pub fn new_txn(&self, ctx: &Context) -> Txn {
        Txn::new(self.clone(), ctx.clone())
    }

    /// Sends a batch outside of any transaction.
    ///
    /// Transaction markers are rejected.
    pub async fn run(&self, ctx: &Context, batch: Batch) -> Result<Vec<Response>, TxnError> {
        let mut ba = batch.into_request();
        if ba.requests.iter().any(|r| r.method().is_txn_control()) {
            return Err(KvError::invalid_request(
                "transaction markers are not allowed in a non-transactional batch",
            )
            .into());
        }
        ba.header.user_priority = self.config.user_priority;
        ba.header.timestamp = Timestamp::ZERO;

        let br = self.send(ctx, ba).await?;
        Ok(br.responses)
    }

    /// Reads a key outside of any transaction.
    pub async fn get(&self, ctx: &Context, key: impl Into<Key>) -> Result<Option<Value>, TxnError> {
        let mut b = Batch::new();
        b.get(key);
        match self.run(ctx, b).await?.pop() {
            Some(Response::Get { value }) => Ok(value),
            other => Err(unexpected(other)),
        }
    }

    /// Writes a key outside of any transaction.
    pub async fn put(
        &self,
        ctx: &Context,
        key: impl Into<Key>,
        value: impl Into<Value>,
    ) -> Result<(), TxnError> {
        let mut b = Batch::new();
        b.put(key, value);
        self.run(ctx, b).await.map(|_| ())
    }

    async fn send(&self, ctx: &Context, ba: BatchRequest) -> Result<BatchResponse, TxnError> {
        ba.validate()?;
        if let Some(err) = ctx.err() {
            return Err(err);
        }
        debug!(methods = ?ba.methods(), "sending non-transactional batch");

        let expected = ba.len();
        let br = tokio::select! {
            biased;
            err = ctx.done() => return Err(err),
            res = self.sender.send(ctx, ba) => res?,
        };
        if br.len() != expected {
            return Err(TxnError::ResponseMismatch {
                expected,
                actual: br.len(),
            });
        }
        Ok(br)
    }
}

impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db").field("config", &self.config).finish()
    }
}

pub(crate) fn unexpected(resp: Option<Response>) -> TxnError {
    KvError::new(ErrorDetail::Internal(format!(
        "unexpected response {:?}",
        resp
    )))
    .into()
}
