// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Retry loop that runs a closure transactionally.
//!
//! Each attempt runs the closure against the same [`Txn`]. What happens next
//! depends on the outcome:
//!
//! | Outcome | Action |
//! |---|---|
//! | `Ok`, transaction still pending | implicit commit (elided if nothing was written) |
//! | `Ok`, closure already committed | done |
//! | `Restart` error | bump epoch, keep identity, back off, run again |
//! | `AbortRetry` error | roll back, clear identity, back off, run again |
//! | `Aborted` error | clear identity (store already aborted), back off, run again |
//! | any other error | roll back if anything was written, return the error |
//! | cancellation | return at once, no further round trips |

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, info, instrument};

use crate::api::{ErrorKind, TxnStatus};

use super::{Backoff, Context, Db, RetryOptions, Txn, TxnError};

/// A boxed future that is Send.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

impl Db {
    /// Runs `retryable` inside a transaction, retrying on retryable errors.
    ///
    /// Returns `Ok(())` only once the transaction has committed (a transaction
    /// that wrote nothing commits without a round trip). The closure may run
    /// more than once and must therefore be idempotent; anything it computes
    /// should be rebuilt on every invocation.
    ///
    /// ```no_run
    /// # use std::sync::Arc;
    /// # use strontium_txn::client::{Context, Db, SenderFn};
    /// # async fn example() -> Result<(), strontium_txn::client::TxnError> {
    /// # let db = Db::new(Arc::new(SenderFn::new(|ba| Ok(ba.create_reply()))));
    /// let ctx = Context::background();
    /// db.run_transaction(&ctx, |txn| {
    ///     Box::pin(async move {
    ///         let n = txn.inc("counter", 1).await?;
    ///         txn.put(format!("row/{n}"), "value").await
    ///     })
    /// })
    /// .await?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self, ctx, retryable), fields(user_priority = self.config().user_priority))]
    pub async fn run_transaction<F>(&self, ctx: &Context, retryable: F) -> Result<(), TxnError>
    where
        F: for<'t> FnMut(&'t mut Txn) -> BoxFuture<'t, Result<(), TxnError>> + Send,
    {
        let mut txn = self.new_txn(ctx);
        let opts = self.config().retry.clone();
        txn.exec(&opts, retryable).await
    }
}

impl Txn {
    /// Drives the attempt loop. Leaves the transaction COMMITTED on success
    /// and ABORTED on failure.
    pub(crate) async fn exec<F>(&mut self, opts: &RetryOptions, mut retryable: F) -> Result<(), TxnError>
    where
        F: for<'t> FnMut(&'t mut Txn) -> BoxFuture<'t, Result<(), TxnError>> + Send,
    {
        let mut backoff = Backoff::new(opts);
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            self.take_pending_retry();

            let mut result = retryable(&mut *self).await;
            if result.is_ok() {
                if let Some(err) = self.take_pending_retry() {
                    debug!(error = %err, "closure swallowed a retryable error");
                    result = Err(err.into());
                }
            }
            if result.is_ok() {
                result = match self.status() {
                    TxnStatus::Pending => self.end(true).await,
                    TxnStatus::Committed => Ok(()),
                    TxnStatus::Aborted => Err(TxnError::RolledBack),
                };
            }

            let err = match result {
                Ok(()) => {
                    debug!(attempt, id = ?self.id(), "transaction committed");
                    return Ok(());
                }
                Err(err) => err,
            };

            if err.is_cancellation() || self.context().err().is_some() {
                self.abandon();
                return Err(err);
            }

            // Committed inside the closure; never run it again.
            if self.status() == TxnStatus::Committed {
                return Err(err);
            }

            let kind = err.kind();
            if kind == ErrorKind::Fatal {
                self.cleanup_on_error(&err).await;
                return Err(err);
            }

            let Some(delay) = backoff.next_delay() else {
                info!(attempt, error = %err, "transaction retries exhausted");
                self.cleanup_on_error(&err).await;
                return Err(err);
            };

            self.prepare_retry(kind, &err).await;
            info!(
                attempt,
                ?kind,
                epoch = self.epoch(),
                backoff = ?delay,
                error = %err,
                "retrying transaction"
            );

            if let Err(cancelled) = self.context().clone().sleep(delay).await {
                self.abandon();
                return Err(cancelled);
            }
        }
    }

    async fn prepare_retry(&mut self, kind: ErrorKind, err: &TxnError) {
        match kind {
            ErrorKind::Restart if self.status() == TxnStatus::Pending => {
                self.proto_mut().restart();
            }
            ErrorKind::Restart | ErrorKind::Aborted => {
                self.proto_mut().reset();
            }
            ErrorKind::AbortRetry => {
                self.cleanup_on_error(err).await;
                self.proto_mut().reset();
            }
            ErrorKind::Fatal => {}
        }
    }

    /// Gives up on the transaction without another round trip. The store
    /// reclaims abandoned transactions on its own.
    fn abandon(&mut self) {
        if self.status() != TxnStatus::Committed {
            self.proto_mut().status = TxnStatus::Aborted;
        }
    }
}
