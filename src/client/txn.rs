// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Transaction handle.

use tracing::{debug, warn};

use crate::api::{
    BatchRequest, BatchResponse, ErrorKind, IsolationLevel, Key, KvError, Method, Request,
    Response, Transaction, TxnId, TxnStatus, Value,
};

use super::db::unexpected;
use super::{Batch, Context, Db, TxnError};

/// A single transaction.
///
/// Every operation builds a batch, stamps it with the transaction record and
/// sends it. The handle inserts a `BeginTransaction` in front of the first
/// write, and never sends an `EndTransaction` for a transaction that wrote
/// nothing.
pub struct Txn {
    db: Db,
    ctx: Context,
    proto: Transaction,
    user_priority: i32,
    /// Retryable error seen by the current attempt, kept in case the caller swallows it.
    pending_retry: Option<KvError>,
}

impl Txn {
    pub(crate) fn new(db: Db, ctx: Context) -> Self {
        let config = db.config();
        let user_priority = config.user_priority;
        let proto = Transaction::new(
            "",
            config.isolation,
            Transaction::make_priority(user_priority),
        );
        Self {
            db,
            ctx,
            proto,
            user_priority,
            pending_retry: None,
        }
    }

    /// Returns the transaction record.
    #[inline]
    pub fn proto(&self) -> &Transaction {
        &self.proto
    }

    #[inline]
    pub fn id(&self) -> Option<TxnId> {
        self.proto.id
    }

    #[inline]
    pub fn status(&self) -> TxnStatus {
        self.proto.status
    }

    #[inline]
    pub fn epoch(&self) -> u32 {
        self.proto.epoch
    }

    #[inline]
    pub fn user_priority(&self) -> i32 {
        self.user_priority
    }

    /// Returns true once a write has been sent.
    #[inline]
    pub fn is_writing(&self) -> bool {
        self.proto.writing
    }

    #[inline]
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Sets the name shown in logs.
    pub fn set_debug_name(&mut self, name: impl Into<String>) {
        self.proto.name = name.into();
    }

    /// Changes the isolation level. Only allowed before the first write.
    pub fn set_isolation(&mut self, isolation: IsolationLevel) -> Result<(), TxnError> {
        if self.proto.isolation != isolation {
            if self.proto.writing {
                return Err(KvError::invalid_request(
                    "cannot change the isolation level of a running transaction",
                )
                .into());
            }
            self.proto.isolation = isolation;
        }
        Ok(())
    }

    /// Overrides the user priority inherited from the client.
    pub fn set_user_priority(&mut self, user_priority: i32) {
        self.user_priority = user_priority;
        self.proto
            .upgrade_priority(Transaction::make_priority(user_priority));
    }

    pub async fn get(&mut self, key: impl Into<Key>) -> Result<Option<Value>, TxnError> {
        match self.send_one(Request::Get { key: key.into() }).await? {
            Response::Get { value } => Ok(value),
            other => Err(unexpected(Some(other))),
        }
    }

    pub async fn put(
        &mut self,
        key: impl Into<Key>,
        value: impl Into<Value>,
    ) -> Result<(), TxnError> {
        self.send_one(Request::Put {
            key: key.into(),
            value: value.into(),
        })
        .await
        .map(|_| ())
    }

    /// Writes `value` only if the current value equals `expected`
    /// (`None`: the key must not exist).
    pub async fn cput(
        &mut self,
        key: impl Into<Key>,
        value: impl Into<Value>,
        expected: Option<Value>,
    ) -> Result<(), TxnError> {
        self.send_one(Request::ConditionalPut {
            key: key.into(),
            value: value.into(),
            expected,
        })
        .await
        .map(|_| ())
    }

    /// Adds `increment` to the integer stored at `key` and returns the new value.
    pub async fn inc(&mut self, key: impl Into<Key>, increment: i64) -> Result<i64, TxnError> {
        match self
            .send_one(Request::Increment {
                key: key.into(),
                increment,
            })
            .await?
        {
            Response::Increment { new_value } => Ok(new_value),
            other => Err(unexpected(Some(other))),
        }
    }

    pub async fn del(&mut self, key: impl Into<Key>) -> Result<(), TxnError> {
        self.send_one(Request::Delete { key: key.into() })
            .await
            .map(|_| ())
    }

    /// Deletes every key in `[start, end)`.
    pub async fn del_range(
        &mut self,
        start: impl Into<Key>,
        end: impl Into<Key>,
    ) -> Result<(), TxnError> {
        self.send_one(Request::DeleteRange {
            start: start.into(),
            end: end.into(),
        })
        .await
        .map(|_| ())
    }

    /// Sends a caller-built batch within the transaction without ending it.
    pub async fn run(&mut self, batch: Batch) -> Result<Vec<Response>, TxnError> {
        if batch.has_end_transaction() {
            return Err(KvError::invalid_request(
                "use commit_in_batch to send a batch that ends the transaction",
            )
            .into());
        }
        let br = self.send(batch.into_request()).await?;
        Ok(br.responses)
    }

    /// Sends `batch` with a trailing commit, ending the transaction in the
    /// same round trip as its last operations.
    ///
    /// Returns one response per operation, followed by the response to the
    /// commit marker (unless the batch already ended with a marker).
    pub async fn commit_in_batch(&mut self, batch: Batch) -> Result<Vec<Response>, TxnError> {
        let mut ba = batch.into_request();
        if ba.end_transaction().is_none() {
            ba.add(Request::EndTransaction { commit: true });
        }
        match self.send(ba).await {
            Ok(br) => Ok(br.responses),
            Err(err) => {
                self.cleanup_on_error(&err).await;
                Err(err)
            }
        }
    }

    /// Commits the transaction. On failure the transaction is rolled back
    /// (unless the store already aborted it) and the commit error returned.
    pub async fn commit(&mut self) -> Result<(), TxnError> {
        match self.end(true).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.cleanup_on_error(&err).await;
                Err(err)
            }
        }
    }

    /// Aborts the transaction. A transaction that already aborted is left alone.
    pub async fn rollback(&mut self) -> Result<(), TxnError> {
        if self.proto.status == TxnStatus::Aborted {
            return Ok(());
        }
        self.end(false).await
    }

    /// Sends a lone end marker. Elided by [`Txn::send`] when nothing was written.
    pub(crate) async fn end(&mut self, commit: bool) -> Result<(), TxnError> {
        let mut ba = BatchRequest::new();
        ba.add(Request::EndTransaction { commit });
        self.send(ba).await.map(|_| ())
    }

    /// Brings the transaction to a terminal state after `err`.
    ///
    /// Sends an abort only when the transaction wrote and the store has not
    /// already aborted it. Rollback failures are logged; the caller surfaces
    /// the original error.
    pub(crate) async fn cleanup_on_error(&mut self, err: &TxnError) {
        if self.proto.status == TxnStatus::Committed {
            return;
        }
        if err.kind() != ErrorKind::Aborted && self.proto.status == TxnStatus::Pending {
            if let Err(rollback_err) = self.rollback().await {
                warn!(
                    txn = %self.proto.name,
                    error = %rollback_err,
                    cause = %err,
                    "failed to roll back transaction"
                );
            }
        }
        self.proto.status = TxnStatus::Aborted;
    }

    async fn send_one(&mut self, req: Request) -> Result<Response, TxnError> {
        let mut ba = BatchRequest::new();
        ba.add(req);
        let mut br = self.send(ba).await?;
        br.responses
            .pop()
            .ok_or(TxnError::ResponseMismatch {
                expected: 1,
                actual: 0,
            })
    }

    /// Stamps `ba` with the transaction and sends it.
    ///
    /// The returned responses line up with the requests the caller put in
    /// `ba`: an inserted `BeginTransaction` is stripped from the reply and an
    /// elided `EndTransaction` gets a synthesized response.
    pub(crate) async fn send(&mut self, mut ba: BatchRequest) -> Result<BatchResponse, TxnError> {
        if self.proto.is_finalized() {
            return Err(TxnError::Finalized(self.proto.status));
        }
        ba.validate()?;
        if ba.get_arg(Method::BeginTransaction).is_some() {
            return Err(KvError::invalid_request(
                "BeginTransaction is inserted by the transaction, not the caller",
            )
            .into());
        }

        let elided_end = match ba.end_transaction() {
            Some(commit) if !self.proto.writing && !ba.is_write() => {
                ba.requests.pop();
                Some(commit)
            }
            _ => None,
        };

        if ba.is_empty() {
            let mut br = BatchResponse::default();
            if let Some(commit) = elided_end {
                self.finish_locally(commit);
                br.responses
                    .push(Response::EndTransaction { committed: commit });
            }
            br.txn = Some(self.proto.clone());
            return Ok(br);
        }

        if let Some(err) = self.ctx.err() {
            return Err(err);
        }

        let began = if self.proto.writing {
            None
        } else {
            ba.first_write().map(|(idx, key)| (idx, key.clone()))
        };
        if let Some((idx, key)) = &began {
            self.proto.key = key.clone();
            ba.requests
                .insert(*idx, Request::BeginTransaction { key: key.clone() });
        }

        ba.header.txn = Some(self.proto.clone());
        ba.header.timestamp = self.proto.timestamp;
        ba.header.user_priority = self.user_priority;

        let expected = ba.len();
        let end = ba.end_transaction();
        let writes = ba.is_write();
        debug!(
            txn = %self.proto.name,
            id = ?self.proto.id,
            epoch = self.proto.epoch,
            timestamp = %self.proto.timestamp,
            methods = ?ba.methods(),
            "sending batch"
        );

        let sender = self.db.sender().clone();
        let ctx = self.ctx.clone();
        let result = tokio::select! {
            biased;
            err = ctx.done() => return Err(err),
            res = sender.send(&ctx, ba) => res,
        };

        // Once a write has been dispatched the store may hold intents for
        // it, whatever came back, so cleanup must send an abort.
        let mut br = match result {
            Ok(br) => br,
            Err(err) => {
                if writes && err.kind() != ErrorKind::Aborted {
                    self.proto.writing = true;
                }
                return Err(self.absorb_error(err));
            }
        };
        if writes {
            self.proto.writing = true;
        }
        if br.len() != expected {
            return Err(TxnError::ResponseMismatch {
                expected,
                actual: br.len(),
            });
        }

        if let Some(txn) = &br.txn {
            self.proto.update(txn);
        }
        if let Some(commit) = end {
            if self.proto.status == TxnStatus::Pending {
                self.finish_locally(commit);
            }
        }

        if let Some((idx, _)) = began {
            br.responses.remove(idx);
        }
        if let Some(commit) = elided_end {
            self.finish_locally(commit);
            br.responses
                .push(Response::EndTransaction { committed: commit });
        }
        br.txn = Some(self.proto.clone());
        Ok(br)
    }

    /// Folds a sender error into the transaction record.
    fn absorb_error(&mut self, err: KvError) -> TxnError {
        if let Some(txn) = err.txn() {
            self.proto.update(txn);
        }
        let kind = err.kind();
        if kind == ErrorKind::Aborted {
            debug!(txn = %self.proto.name, id = ?self.proto.id, "transaction aborted by store, clearing identity");
            self.proto.reset();
        }
        if kind.is_retryable() {
            self.pending_retry = Some(err.clone());
        }
        err.into()
    }

    fn finish_locally(&mut self, commit: bool) {
        self.proto.status = if commit {
            TxnStatus::Committed
        } else {
            TxnStatus::Aborted
        };
    }

    pub(crate) fn take_pending_retry(&mut self) -> Option<KvError> {
        self.pending_retry.take()
    }

    pub(crate) fn proto_mut(&mut self) -> &mut Transaction {
        &mut self.proto
    }
}

impl std::fmt::Debug for Txn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Txn")
            .field("proto", &self.proto)
            .field("user_priority", &self.user_priority)
            .finish()
    }
}
