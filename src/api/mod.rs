// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Request/response model shared by the transaction client and the store.
//!
//! A [`BatchRequest`] carries an optional [`Transaction`] record, a requested
//! timestamp and an ordered list of [`Request`]s. The store answers with a
//! [`BatchResponse`] holding one [`Response`] per request, in the same order,
//! or with a [`KvError`] whose [`ErrorKind`] tells the client whether to
//! restart, retry as a new transaction, or give up.

mod batch;
mod data;
mod error;
mod request;
mod transaction;

pub use batch::{BatchRequest, BatchResponse, Header};
pub use data::{Key, Value, MAX_KEY_SIZE, MAX_VALUE_SIZE};
pub use error::{ErrorDetail, ErrorKind, KvError};
pub use request::{Method, Request, Response};
pub use transaction::{IsolationLevel, Transaction, TxnId, TxnStatus};
