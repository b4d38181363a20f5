// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! StrontiumDB transaction client: runs user code as serializable transactions
//! over the distributed key-value store, retrying on conflicts
//!
//! This crate provides the client-side half of a transaction: batching,
//! lazy begin/commit markers, timestamp ratcheting, error classification and
//! the retry loop. The store is reached through the [`client::Sender`] trait.

pub mod api;
pub mod client;
pub mod time;

pub use api::{
    BatchRequest, BatchResponse, ErrorDetail, ErrorKind, IsolationLevel, Key, KvError, Method,
    Request, Response, Transaction, TxnId, TxnStatus, Value,
};
pub use client::{
    Batch, BoxFuture, Context, Db, DbConfig, RetryOptions, Sender, SenderFn, Txn, TxnError,
};
pub use time::{HlcClock, Timestamp};
