//! Integer-tick price type
//!
//! Prices are whole tick counts (one tick is one thousandth of a dollar),
//! which keeps all book arithmetic exact. `INF` and `NEG_INF` are sentinel
//! values used only in best-price comparisons for order routing; they never
//! enter an order book.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of price ticks per dollar.
pub const TICKS_PER_DOLLAR: i64 = 1000;

/// A limit or execution price in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price {
    ticks: i64,
}

impl Price {
    pub const ZERO: Price = Price { ticks: 0 };

    /// Sentinel greater than every real price. Routing comparisons only.
    pub const INF: Price = Price { ticks: i64::MAX };

    /// Sentinel less than every real price. Routing comparisons only.
    pub const NEG_INF: Price = Price { ticks: i64::MIN };

    /// Create a price from a tick count.
    pub fn of(ticks: i64) -> Self {
        Self { ticks }
    }

    /// Raw tick count.
    pub fn ticks(&self) -> i64 {
        self.ticks
    }

    /// Whether this is a real price rather than a routing sentinel.
    pub fn is_finite(&self) -> bool {
        *self != Price::INF && *self != Price::NEG_INF
    }

    /// Round to the nearest multiple of `tick_size`, ties rounding up.
    /// Sentinels quantize to themselves.
    ///
    /// # Panics
    /// Panics if `tick_size` is not positive.
    pub fn quantize(self, tick_size: i64) -> Price {
        assert!(tick_size > 0, "tick size must be positive");
        if !self.is_finite() {
            return self;
        }
        let rem = self.ticks.rem_euclid(tick_size);
        let floor = self.ticks - rem;
        if rem * 2 >= tick_size {
            Price::of(floor + tick_size)
        } else {
            Price::of(floor)
        }
    }

    /// This price, floored at zero.
    pub fn non_negative(self) -> Price {
        self.max(Price::ZERO)
    }

    /// Price in dollars.
    pub fn as_dollars(&self) -> f64 {
        self.ticks as f64 / TICKS_PER_DOLLAR as f64
    }

    /// Price as an exact decimal tick count.
    pub fn as_decimal(&self) -> Decimal {
        Decimal::from(self.ticks)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Price::INF {
            write!(f, "$inf")
        } else if *self == Price::NEG_INF {
            write!(f, "-$inf")
        } else {
            write!(f, "${}", self.ticks)
        }
    }
}
