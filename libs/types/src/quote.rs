//! Market quotes and the cross-market best bid/offer
//!
//! A `Quote` is one market's displayed best bid and ask at a point in
//! market time. A `BestBidAsk` is the best bid and ask across every tracked
//! market, as seen through the information processor's latency — it never
//! reflects quotes that have not yet arrived.

use crate::ids::MarketId;
use crate::numeric::Price;
use crate::time::MarketTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One market's best bid and ask with quantities.
///
/// Either side may be absent when no orders rest there. `quote_time` is the
/// market time at which the quote was computed and is used downstream to
/// discard stale, out-of-order updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    market: MarketId,
    bid: Option<Price>,
    bid_quantity: u64,
    ask: Option<Price>,
    ask_quantity: u64,
    quote_time: MarketTime,
}

impl Quote {
    /// Create a quote.
    ///
    /// # Panics
    /// Panics if both sides are present and the bid exceeds the ask; a
    /// crossed quote indicates a matching bug, not a recoverable state.
    pub fn new(
        market: MarketId,
        bid: Option<Price>,
        bid_quantity: u64,
        ask: Option<Price>,
        ask_quantity: u64,
        quote_time: MarketTime,
    ) -> Self {
        if let (Some(b), Some(a)) = (bid, ask) {
            assert!(a >= b, "invalid quote: bid {} > ask {}", b, a);
        }
        Self {
            market,
            bid,
            bid_quantity,
            ask,
            ask_quantity,
            quote_time,
        }
    }

    /// Quote with no resting orders on either side.
    pub fn empty(market: MarketId) -> Self {
        Self::new(market, None, 0, None, 0, MarketTime::ZERO)
    }

    pub fn market(&self) -> MarketId {
        self.market
    }

    pub fn bid_price(&self) -> Option<Price> {
        self.bid
    }

    pub fn ask_price(&self) -> Option<Price> {
        self.ask
    }

    pub fn bid_quantity(&self) -> u64 {
        self.bid_quantity
    }

    pub fn ask_quantity(&self) -> u64 {
        self.ask_quantity
    }

    pub fn quote_time(&self) -> MarketTime {
        self.quote_time
    }

    /// Whether both sides are present.
    pub fn is_defined(&self) -> bool {
        self.bid.is_some() && self.ask.is_some()
    }

    /// Bid-ask spread in ticks, when both sides are present.
    pub fn spread(&self) -> Option<i64> {
        match (self.bid, self.ask) {
            (Some(b), Some(a)) => Some(a.ticks() - b.ticks()),
            _ => None,
        }
    }

    /// Midpoint of bid and ask in exact tick arithmetic.
    pub fn midquote(&self) -> Option<Decimal> {
        match (self.bid, self.ask) {
            (Some(b), Some(a)) => Some((b.as_decimal() + a.as_decimal()) / Decimal::from(2)),
            _ => None,
        }
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(Bid: ")?;
        match self.bid {
            Some(b) => write!(f, "{} @ {}", self.bid_quantity, b)?,
            None => write!(f, "-")?,
        }
        write!(f, ", Ask: ")?;
        match self.ask {
            Some(a) => write!(f, "{} @ {}", self.ask_quantity, a)?,
            None => write!(f, "-")?,
        }
        write!(f, ")")
    }
}

/// Best price on one side of the national best bid/offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestQuote {
    pub market: MarketId,
    pub price: Price,
    pub quantity: u64,
}

/// National best bid and offer across all tracked markets.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BestBidAsk {
    bid: Option<BestQuote>,
    ask: Option<BestQuote>,
}

impl BestBidAsk {
    pub fn new(bid: Option<BestQuote>, ask: Option<BestQuote>) -> Self {
        Self { bid, ask }
    }

    /// NBBO with no quotes received yet.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bid(&self) -> Option<&BestQuote> {
        self.bid.as_ref()
    }

    pub fn ask(&self) -> Option<&BestQuote> {
        self.ask.as_ref()
    }

    /// Best bid price, or the routing sentinel when absent.
    pub fn bid_price_or_neg_inf(&self) -> Price {
        self.bid.map(|b| b.price).unwrap_or(Price::NEG_INF)
    }

    /// Best ask price, or the routing sentinel when absent.
    pub fn ask_price_or_inf(&self) -> Price {
        self.ask.map(|a| a.price).unwrap_or(Price::INF)
    }

    /// Spread in ticks, when both sides are present and not crossed.
    pub fn spread(&self) -> Option<i64> {
        match (&self.bid, &self.ask) {
            (Some(b), Some(a)) if a.price >= b.price => Some(a.price.ticks() - b.price.ticks()),
            _ => None,
        }
    }
}

impl fmt::Display for BestBidAsk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(BestBid: ")?;
        match &self.bid {
            Some(b) => write!(f, "{} @ {} from {}", b.quantity, b.price, b.market)?,
            None => write!(f, "-")?,
        }
        write!(f, ", BestAsk: ")?;
        match &self.ask {
            Some(a) => write!(f, "{} @ {} from {}", a.quantity, a.price, a.market)?,
            None => write!(f, "-")?,
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TimeStamp;
    use rust_decimal::prelude::FromPrimitive;

    fn quote_time(ticks: i64, seq: u64) -> MarketTime {
        MarketTime::new(TimeStamp::of(ticks), seq)
    }

    #[test]
    fn test_empty_quote() {
        let q = Quote::empty(MarketId::of(0));
        assert!(!q.is_defined());
        assert_eq!(q.spread(), None);
        assert_eq!(q.midquote(), None);
    }

    #[test]
    fn test_spread_and_midquote() {
        let q = Quote::new(
            MarketId::of(0),
            Some(Price::of(100)),
            2,
            Some(Price::of(110)),
            1,
            quote_time(5, 1),
        );
        assert!(q.is_defined());
        assert_eq!(q.spread(), Some(10));
        assert_eq!(q.midquote(), Decimal::from_i64(105));
    }

    #[test]
    #[should_panic(expected = "invalid quote")]
    fn test_crossed_quote_rejected() {
        Quote::new(
            MarketId::of(0),
            Some(Price::of(120)),
            1,
            Some(Price::of(110)),
            1,
            quote_time(5, 1),
        );
    }

    #[test]
    fn test_nbbo_sentinels() {
        let nbbo = BestBidAsk::empty();
        assert_eq!(nbbo.bid_price_or_neg_inf(), Price::NEG_INF);
        assert_eq!(nbbo.ask_price_or_inf(), Price::INF);
        assert_eq!(nbbo.spread(), None);
    }

    #[test]
    fn test_nbbo_spread() {
        let nbbo = BestBidAsk::new(
            Some(BestQuote {
                market: MarketId::of(0),
                price: Price::of(80),
                quantity: 1,
            }),
            Some(BestQuote {
                market: MarketId::of(1),
                price: Price::of(90),
                quantity: 1,
            }),
        );
        assert_eq!(nbbo.spread(), Some(10));
    }

    #[test]
    fn test_quote_serialization() {
        let q = Quote::new(
            MarketId::of(3),
            Some(Price::of(100)),
            2,
            None,
            0,
            quote_time(7, 4),
        );
        let json = serde_json::to_string(&q).unwrap();
        let back: Quote = serde_json::from_str(&json).unwrap();
        assert_eq!(back, q);
    }
}
