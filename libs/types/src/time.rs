//! Simulation time types
//!
//! `TimeStamp` is a logical tick count. It carries a distinguished
//! `IMMEDIATE` value that sorts before every finite time and means
//! "zero latency, before the clock next advances" — it is not tick zero.
//! `MarketTime` totally orders order submissions within one market by
//! pairing a timestamp with a strictly increasing sequence number.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of simulation ticks per second of simulated wall time.
pub const TICKS_PER_SECOND: i64 = 1_000_000;

/// Logical simulation time, measured in ticks.
///
/// Immutable; construct through `of` or the constants. Finite timestamps
/// are non-negative. `IMMEDIATE` compares before every finite time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeStamp {
    ticks: i64,
}

impl TimeStamp {
    /// Tick zero, the start of simulated time.
    pub const ZERO: TimeStamp = TimeStamp { ticks: 0 };

    /// Zero-latency marker. Sorts before every finite time and never
    /// appears as an executed activity's time.
    pub const IMMEDIATE: TimeStamp = TimeStamp { ticks: -1 };

    /// Create a finite timestamp.
    ///
    /// # Panics
    /// Panics if `ticks` is negative; negative finite times do not exist.
    pub fn of(ticks: i64) -> Self {
        assert!(ticks >= 0, "finite timestamps must be non-negative");
        Self { ticks }
    }

    /// Whether this is the zero-latency marker.
    pub fn is_immediate(&self) -> bool {
        self.ticks < 0
    }

    /// Tick count of a finite timestamp.
    ///
    /// # Panics
    /// Panics on `IMMEDIATE`, which has no tick value.
    pub fn ticks(&self) -> i64 {
        assert!(!self.is_immediate(), "IMMEDIATE has no tick value");
        self.ticks
    }

    /// Sum of two finite timestamps.
    ///
    /// # Panics
    /// Panics if either operand is `IMMEDIATE`.
    pub fn plus(self, other: TimeStamp) -> TimeStamp {
        TimeStamp::of(self.ticks() + other.ticks())
    }

    /// Difference of two finite timestamps.
    ///
    /// # Panics
    /// Panics if either operand is `IMMEDIATE` or the result is negative.
    pub fn minus(self, other: TimeStamp) -> TimeStamp {
        TimeStamp::of(self.ticks() - other.ticks())
    }

    /// Time in simulated seconds.
    pub fn as_seconds(&self) -> f64 {
        self.ticks() as f64 / TICKS_PER_SECOND as f64
    }
}

impl fmt::Display for TimeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_immediate() {
            write!(f, "immediate")
        } else {
            write!(f, "{}t", self.ticks)
        }
    }
}

/// Total-order tie-break key for order submissions within one market.
///
/// Combines the submission timestamp with a per-market strictly increasing
/// sequence number, so two orders never compare equal. The market that
/// assigns sequence numbers is responsible for their uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarketTime {
    time: TimeStamp,
    sequence: u64,
}

impl MarketTime {
    /// Market time zero, before any order has been accepted.
    pub const ZERO: MarketTime = MarketTime {
        time: TimeStamp::ZERO,
        sequence: 0,
    };

    /// Create a market time from a finite timestamp and a sequence number.
    pub fn new(time: TimeStamp, sequence: u64) -> Self {
        assert!(!time.is_immediate(), "market time requires a finite timestamp");
        Self { time, sequence }
    }

    /// The wall-clock component.
    pub fn time(&self) -> TimeStamp {
        self.time
    }

    /// The per-market sequence component.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl fmt::Display for MarketTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.time, self.sequence)
    }
}
