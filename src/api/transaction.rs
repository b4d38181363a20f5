// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Transaction record and state.

use std::fmt;

use crate::time::Timestamp;

use super::Key;

/// Unique transaction identifier, assigned by the store on first contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxnId(pub uuid::Uuid);

impl TxnId {
    /// Generates a fresh random identifier.
    pub fn new_random() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Returns a short prefix suitable for log lines.
    pub fn short(&self) -> String {
        let mut s = self.0.simple().to_string();
        s.truncate(8);
        s
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction isolation levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    /// Serializable - full isolation, read-write conflicts also detected.
    #[default]
    Serializable,
    /// Snapshot isolation - reads see consistent snapshot, write-write conflicts detected.
    Snapshot,
}

/// Transaction status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxnStatus {
    #[default]
    Pending,
    Committed,
    Aborted,
}

impl fmt::Display for TxnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxnStatus::Pending => "PENDING",
            TxnStatus::Committed => "COMMITTED",
            TxnStatus::Aborted => "ABORTED",
        };
        f.write_str(s)
    }
}

/// The transaction record carried on every transactional request.
///
/// The client owns one record per transaction and merges in whatever the
/// store sends back through [`Transaction::update`]. Timestamp and priority
/// only move forward.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    /// Debug name, propagated into logs.
    pub name: String,
    /// Identifier; `None` until the store has seen the transaction.
    pub id: Option<TxnId>,
    /// Anchor key: the key of the first write.
    pub key: Key,
    /// Incremented on every client-visible restart that keeps the identity.
    pub epoch: u32,
    /// Current candidate commit timestamp.
    pub timestamp: Timestamp,
    /// Conflict arbitration priority; higher wins.
    pub priority: i32,
    pub isolation: IsolationLevel,
    pub status: TxnStatus,
    /// True once a mutating batch has been sent successfully.
    pub writing: bool,
}

impl Transaction {
    /// Creates a fresh pending transaction record.
    pub fn new(name: impl Into<String>, isolation: IsolationLevel, priority: i32) -> Self {
        Self {
            name: name.into(),
            isolation,
            priority,
            ..Self::default()
        }
    }

    /// Computes a priority from a user priority.
    ///
    /// A non-positive user priority `p` is taken literally as the fixed
    /// priority `-p` (at least 1). A positive one produces a random priority
    /// whose expected value scales with it.
    pub fn make_priority(user_priority: i32) -> i32 {
        if user_priority <= 0 {
            return user_priority.saturating_neg().max(1);
        }
        let scale = f64::from(user_priority) * 1000.0;
        let p = rand::random::<f64>() * scale;
        (p as i32).clamp(1, i32::MAX)
    }

    /// Raises the priority to at least `min`.
    #[inline]
    pub fn upgrade_priority(&mut self, min: i32) {
        if min > self.priority {
            self.priority = min;
        }
    }

    /// Returns true once the transaction has committed or aborted.
    #[inline]
    pub fn is_finalized(&self) -> bool {
        self.status != TxnStatus::Pending
    }

    /// Merges a record returned by the store into this one.
    ///
    /// Identity is adopted only if we have none. Timestamp, epoch and
    /// priority are ratcheted; a non-pending status is adopted; the writing
    /// flag is sticky.
    pub fn update(&mut self, other: &Transaction) {
        if self.id.is_none() {
            self.id = other.id;
        }
        if self.key.is_empty() {
            self.key = other.key.clone();
        }
        if other.status != TxnStatus::Pending {
            self.status = other.status;
        }
        if other.epoch > self.epoch {
            self.epoch = other.epoch;
        }
        self.timestamp.forward(other.timestamp);
        self.upgrade_priority(other.priority);
        self.writing |= other.writing;
    }

    /// Prepares the record for a restart that keeps its identity.
    pub fn restart(&mut self) {
        self.epoch += 1;
        self.status = TxnStatus::Pending;
    }

    /// Clears the identity so the next attempt runs as a brand-new transaction.
    ///
    /// Name, isolation and (ratcheted) priority survive.
    pub fn reset(&mut self) {
        self.id = None;
        self.key = Key::default();
        self.epoch = 0;
        self.timestamp = Timestamp::ZERO;
        self.status = TxnStatus::Pending;
        self.writing = false;
    }
}
