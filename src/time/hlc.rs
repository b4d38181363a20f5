// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Hybrid Logical Clock (HLC) implementation.
//!
//! HLC combines physical time with a logical counter to provide monotonic timestamps
//! even when physical clocks are imperfect. Store-side senders use it to stamp
//! transactions on first contact and to absorb timestamps observed from peers.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use super::Timestamp;

/// Hybrid Logical Clock.
///
/// Guarantees that each call to `now()` returns a timestamp greater than all previous
/// calls and all timestamps passed to `update()`, even under concurrent access.
pub struct HlcClock {
    last: Mutex<Timestamp>,
    max_offset: Duration,
}

impl HlcClock {
    /// Creates a new HLC with the given maximum clock offset assumption.
    ///
    /// The `max_offset` parameter represents the assumed maximum clock skew between
    /// nodes in the cluster. Remote timestamps further ahead than this are still
    /// absorbed but reported by [`HlcClock::update`].
    pub fn new(max_offset: Duration) -> Self {
        Self {
            last: Mutex::new(Timestamp::ZERO),
            max_offset,
        }
    }

    fn physical_time_nanos() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    }

    /// Returns a timestamp strictly greater than any previously issued or observed.
    pub fn now(&self) -> Timestamp {
        let physical = Self::physical_time_nanos();
        let mut last = self.last.lock();

        *last = if physical > last.wall_time() {
            Timestamp::new(physical, 0)
        } else {
            last.next()
        };
        *last
    }

    /// Absorbs a timestamp observed from another node.
    ///
    /// Returns false if `remote` is ahead of local physical time by more than
    /// the configured maximum offset.
    pub fn update(&self, remote: Timestamp) -> bool {
        let physical = Self::physical_time_nanos();
        let mut last = self.last.lock();
        last.forward(remote);

        let offset = remote.wall_time().saturating_sub(physical);
        offset <= self.max_offset.as_nanos() as u64
    }

    /// Returns the configured maximum clock offset.
    #[inline]
    pub fn max_offset(&self) -> Duration {
        self.max_offset
    }
}

impl Default for HlcClock {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl std::fmt::Debug for HlcClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HlcClock")
            .field("last", &*self.last.lock())
            .field("max_offset", &self.max_offset)
            .finish()
    }
}
