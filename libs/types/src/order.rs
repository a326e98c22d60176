//! Order sides and order identity
//!
//! An `OrderRef` is the immutable identity of a submitted order: who placed
//! it, on which side, at what limit price, and when. Open quantities live in
//! the order book, which may split an order into matched and unmatched
//! pieces; every piece carries the same `OrderRef`, so partial fills never
//! lose the original order's identity for notification purposes.

use crate::ids::{AgentId, OrderId};
use crate::numeric::Price;
use crate::time::MarketTime;
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Immutable identity of a submitted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRef {
    pub id: OrderId,
    pub agent: AgentId,
    pub side: Side,
    pub price: Price,
    /// Submission tie-break key; unique within the owning market.
    pub submitted: MarketTime,
}

impl OrderRef {
    pub fn new(id: OrderId, agent: AgentId, side: Side, price: Price, submitted: MarketTime) -> Self {
        Self {
            id,
            agent,
            side,
            price,
            submitted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TimeStamp;

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_order_ref_serialization() {
        let order = OrderRef::new(
            OrderId::of(1),
            AgentId::of(2),
            Side::Buy,
            Price::of(110),
            MarketTime::new(TimeStamp::of(100), 1),
        );
        let json = serde_json::to_string(&order).unwrap();
        let back: OrderRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, order);
    }
}
