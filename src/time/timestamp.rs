// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Hybrid logical timestamp.

use std::fmt;

/// A hybrid logical timestamp: physical wall time plus a logical counter.
///
/// Timestamps are totally ordered by `(wall_time, logical)`. Transactions
/// only ever move their timestamp forward; see [`Timestamp::forward`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    wall_time: u64,
    logical: u32,
}

impl Timestamp {
    /// The zero timestamp. A transaction record carrying it has not yet
    /// been stamped by the store.
    pub const ZERO: Timestamp = Timestamp {
        wall_time: 0,
        logical: 0,
    };

    /// The largest representable timestamp.
    pub const MAX: Timestamp = Timestamp {
        wall_time: u64::MAX,
        logical: u32::MAX,
    };

    /// Creates a timestamp from wall time (nanoseconds since Unix epoch) and a logical tick.
    #[inline]
    pub const fn new(wall_time: u64, logical: u32) -> Self {
        Self { wall_time, logical }
    }

    /// Returns the wall time component.
    #[inline]
    pub fn wall_time(&self) -> u64 {
        self.wall_time
    }

    /// Returns the logical component.
    #[inline]
    pub fn logical(&self) -> u32 {
        self.logical
    }

    /// Returns true if this is the zero timestamp.
    #[inline]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Returns the timestamp offset by the given wall and logical amounts.
    #[inline]
    pub fn add(&self, wall_time: u64, logical: u32) -> Self {
        Self {
            wall_time: self.wall_time.saturating_add(wall_time),
            logical: self.logical.saturating_add(logical),
        }
    }

    /// Returns the smallest timestamp strictly greater than this one.
    #[inline]
    pub fn next(&self) -> Self {
        if self.logical == u32::MAX {
            Self::new(self.wall_time.saturating_add(1), 0)
        } else {
            Self::new(self.wall_time, self.logical + 1)
        }
    }

    /// Ratchets this timestamp up to `other` if `other` is greater.
    ///
    /// Returns true if the timestamp moved. A timestamp never moves backward
    /// through this method.
    #[inline]
    pub fn forward(&mut self, other: Timestamp) -> bool {
        if other > *self {
            *self = other;
            true
        } else {
            false
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.wall_time, self.logical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        let t1 = Timestamp::new(10, 5);
        let t2 = Timestamp::new(10, 6);
        let t3 = Timestamp::new(11, 0);
        assert!(t1 < t2);
        assert!(t2 < t3);
        assert!(Timestamp::ZERO < t1);
    }

    #[test]
    fn test_forward() {
        let mut ts = Timestamp::new(10, 1);

        assert!(!ts.forward(Timestamp::new(10, 0)));
        assert_eq!(ts, Timestamp::new(10, 1));

        assert!(ts.forward(Timestamp::new(20, 1)));
        assert_eq!(ts, Timestamp::new(20, 1));

        assert!(!ts.forward(Timestamp::ZERO));
        assert_eq!(ts, Timestamp::new(20, 1));
    }

    #[test]
    fn test_next() {
        assert_eq!(Timestamp::new(1, 1).next(), Timestamp::new(1, 2));
        assert_eq!(Timestamp::new(1, u32::MAX).next(), Timestamp::new(2, 0));
    }

    #[test]
    fn test_add_saturates() {
        let ts = Timestamp::new(u64::MAX - 1, 3);
        assert_eq!(ts.add(10, 1), Timestamp::new(u64::MAX, 4));
    }

    #[test]
    fn test_display() {
        assert_eq!(Timestamp::new(20, 1).to_string(), "20.000000001");
        assert!(Timestamp::ZERO.is_zero());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (0u64..1_000_000, 0u32..100).prop_map(|(wall, logical)| Timestamp::new(wall, logical))
    }

    proptest! {
        #[test]
        fn forward_never_regresses(
            start in arb_timestamp(),
            updates in prop::collection::vec(arb_timestamp(), 0..32)
        ) {
            let mut ts = start;
            for update in updates {
                let before = ts;
                ts.forward(update);
                prop_assert!(ts >= before);
                prop_assert!(ts >= update);
            }
        }

        #[test]
        fn forward_reports_movement(a in arb_timestamp(), b in arb_timestamp()) {
            let mut ts = a;
            let moved = ts.forward(b);
            prop_assert_eq!(moved, b > a);
            prop_assert_eq!(ts, a.max(b));
        }

        #[test]
        fn next_is_strictly_greater(a in arb_timestamp()) {
            prop_assert!(a.next() > a);
        }
    }
}
