// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Hybrid logical time.
//!
//! Transactions carry a [`Timestamp`] that the store may push forward. The
//! client adopts the maximum of what it asked for and what the store
//! returned, so a transaction's timestamp never moves backward while it
//! keeps its identity.
//!
//! # Example
//!
//! ```
//! use strontium_txn::time::{HlcClock, Timestamp};
//!
//! let clock = HlcClock::default();
//! let mut ts = Timestamp::ZERO;
//! ts.forward(clock.now());
//! assert!(!ts.is_zero());
//! ```

mod hlc;
mod timestamp;

pub use hlc::HlcClock;
pub use timestamp::Timestamp;
