//! Transaction records
//!
//! A `Transaction` is the immutable record of one cleared pairing: the buy
//! and sell order identities, the executed quantity, the clearing price, and
//! the execution time. Markets retain transactions in an append-only log in
//! execution order.

use crate::numeric::Price;
use crate::order::{OrderRef, Side};
use crate::time::TimeStamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One executed trade between a buy and a sell order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub buy: OrderRef,
    pub sell: OrderRef,
    pub quantity: u64,
    pub price: Price,
    pub exec_time: TimeStamp,
}

impl Transaction {
    /// Create a transaction record.
    ///
    /// # Panics
    /// Panics on a zero quantity or mismatched sides; both indicate a
    /// clearing bug rather than recoverable input.
    pub fn new(buy: OrderRef, sell: OrderRef, quantity: u64, price: Price, exec_time: TimeStamp) -> Self {
        assert!(quantity > 0, "transactions must have positive quantity");
        assert_eq!(buy.side, Side::Buy, "buy leg must be a buy order");
        assert_eq!(sell.side, Side::Sell, "sell leg must be a sell order");
        Self {
            buy,
            sell,
            quantity,
            price,
            exec_time,
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transaction[{} x {} @ {} ({} <- {})]",
            self.quantity, self.price, self.exec_time, self.buy.agent, self.sell.agent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{AgentId, OrderId};
    use crate::time::MarketTime;

    fn order(id: u64, side: Side, price: i64) -> OrderRef {
        OrderRef::new(
            OrderId::of(id),
            AgentId::of(id),
            side,
            Price::of(price),
            MarketTime::new(TimeStamp::of(100), id),
        )
    }

    #[test]
    fn test_transaction_creation() {
        let tx = Transaction::new(
            order(1, Side::Buy, 110),
            order(2, Side::Sell, 100),
            3,
            Price::of(105),
            TimeStamp::of(200),
        );
        assert_eq!(tx.quantity, 3);
        assert_eq!(tx.price, Price::of(105));
    }

    #[test]
    #[should_panic(expected = "positive quantity")]
    fn test_zero_quantity_rejected() {
        Transaction::new(
            order(1, Side::Buy, 110),
            order(2, Side::Sell, 100),
            0,
            Price::of(105),
            TimeStamp::of(200),
        );
    }

    #[test]
    #[should_panic(expected = "buy leg must be a buy order")]
    fn test_mismatched_sides_rejected() {
        Transaction::new(
            order(1, Side::Sell, 110),
            order(2, Side::Sell, 100),
            1,
            Price::of(105),
            TimeStamp::of(200),
        );
    }

    #[test]
    fn test_serialization() {
        let tx = Transaction::new(
            order(1, Side::Buy, 110),
            order(2, Side::Sell, 100),
            3,
            Price::of(105),
            TimeStamp::of(200),
        );
        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tx);
    }
}
