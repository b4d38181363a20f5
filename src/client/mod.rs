// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Transactional key-value client with automatic retries.
//!
//! This module provides:
//! - [`Db`]: the client handle, owning a [`Sender`] and a [`DbConfig`]
//! - [`Txn`]: one transaction; lazily begins on the first write and only
//!   sends an end marker if something was written
//! - [`Db::run_transaction`]: runs a closure transactionally, committing on
//!   success, rolling back on failure and retrying with exponential backoff
//!   on retryable conflicts
//!
//! # Key Concepts
//!
//! ## Begin/End Elision
//!
//! A transaction that only reads never sends `BeginTransaction` or
//! `EndTransaction`. The begin marker is placed right in front of the first
//! write; the end marker is sent once, by the closure (`commit`,
//! `rollback`, `commit_in_batch`) or by the retry loop, never both.
//!
//! ## Timestamp Ratchet
//!
//! The store may push a transaction's timestamp or priority. Every reply
//! and every error carrying a transaction record is merged back, keeping the
//! maximum, so the client-side timestamp never moves backward.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use strontium_txn::client::{Context, Db, DbConfig, RetryOptions, SenderFn};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let sender = Arc::new(SenderFn::new(|ba| Ok(ba.create_reply())));
//! let config = DbConfig::default()
//!     .with_retry(RetryOptions::default().with_initial_backoff(Duration::from_millis(10)));
//! let db = Db::with_config(sender, config);
//!
//! let ctx = Context::background().with_timeout(Duration::from_secs(5));
//! db.run_transaction(&ctx, |txn| {
//!     Box::pin(async move {
//!         if txn.get("a").await?.is_none() {
//!             txn.put("a", "b").await?;
//!         }
//!         Ok(())
//!     })
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

mod backoff;
mod batch;
mod config;
mod context;
mod coordinator;
mod db;
mod error;
mod sender;
mod txn;

#[cfg(test)]
mod test_sender;

pub use backoff::Backoff;
pub use batch::Batch;
pub use config::{DbConfig, RetryOptions};
pub use context::Context;
pub use coordinator::BoxFuture;
pub use db::Db;
pub use error::TxnError;
pub use sender::{Sender, SenderFn};
pub use txn::Txn;
