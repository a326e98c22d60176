//! Matched buy/sell order pairs

use serde::{Deserialize, Serialize};
use types::order::{OrderRef, Side};

/// A pairing of one buy and one sell order with an agreed quantity,
/// produced by the book's clearing step and consumed by a pricing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedOrders {
    buy: OrderRef,
    sell: OrderRef,
    quantity: u64,
}

impl MatchedOrders {
    /// Create a matched pair.
    ///
    /// # Panics
    /// Panics on mismatched sides, a zero quantity, or an uncrossed pair —
    /// all indicate a matching bug.
    pub fn new(buy: OrderRef, sell: OrderRef, quantity: u64) -> Self {
        assert_eq!(buy.side, Side::Buy, "buy leg must be a buy order");
        assert_eq!(sell.side, Side::Sell, "sell leg must be a sell order");
        assert!(quantity > 0, "matched quantity must be positive");
        assert!(
            buy.price >= sell.price,
            "matched pair must cross: {} < {}",
            buy.price,
            sell.price
        );
        Self { buy, sell, quantity }
    }

    pub fn buy(&self) -> &OrderRef {
        &self.buy
    }

    pub fn sell(&self) -> &OrderRef {
        &self.sell
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }
}
