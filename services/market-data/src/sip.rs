//! NBBO aggregation with stale-quote rejection
//!
//! The SIP caches the last applied quote per tracked market and keeps the
//! NBBO current incrementally: an improving side is adopted in O(1); only
//! when the market that *was* best regresses does a full rescan of the
//! cached quotes run. A non-best market getting worse changes nothing.

use std::collections::HashMap;

use tracing::{debug, trace};
use types::ids::MarketId;
use types::numeric::Price;
use types::order::Side;
use types::quote::{BestBidAsk, BestQuote, Quote};
use types::time::TimeStamp;

/// What a quote arrival did to the SIP's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SipOutcome {
    /// The quote was applied and the NBBO changed.
    Updated,
    /// The quote was applied but the NBBO is unchanged.
    Unchanged,
    /// The quote was older than the last applied one and was discarded.
    Stale,
}

/// Security information processor for one simulation run.
#[derive(Debug)]
pub struct Sip {
    latency: TimeStamp,
    quotes: HashMap<MarketId, Quote>,
    nbbo: BestBidAsk,
}

impl Sip {
    /// Create a SIP whose published view lags markets by `latency`.
    pub fn new(latency: TimeStamp) -> Self {
        Self {
            latency,
            quotes: HashMap::new(),
            nbbo: BestBidAsk::empty(),
        }
    }

    /// Propagation delay between a market quote update and its arrival here.
    pub fn latency(&self) -> TimeStamp {
        self.latency
    }

    /// Begin tracking a market. Until its first quote arrives the market
    /// contributes nothing to the NBBO.
    pub fn track(&mut self, market: MarketId) {
        self.quotes.entry(market).or_insert_with(|| Quote::empty(market));
    }

    /// Apply an arriving quote.
    ///
    /// A quote whose time is not after the last applied quote's time for
    /// the same market is stale — discarded with no effect.
    pub fn process_quote(&mut self, quote: Quote) -> SipOutcome {
        let market = quote.market();
        if let Some(previous) = self.quotes.get(&market) {
            if quote.quote_time() <= previous.quote_time() {
                trace!(%market, time = %quote.quote_time(), "stale quote discarded");
                return SipOutcome::Stale;
            }
        }
        self.quotes.insert(market, quote.clone());

        let bid_changed = self.update_side(Side::Buy, &quote);
        let ask_changed = self.update_side(Side::Sell, &quote);

        if bid_changed || ask_changed {
            debug!(%market, nbbo = %self.nbbo, "nbbo updated");
            SipOutcome::Updated
        } else {
            SipOutcome::Unchanged
        }
    }

    /// The national best bid and offer over all arrived quotes.
    pub fn nbbo(&self) -> &BestBidAsk {
        &self.nbbo
    }

    /// Last applied quote for a market.
    pub fn quote(&self, market: MarketId) -> Option<&Quote> {
        self.quotes.get(&market)
    }

    /// Number of tracked markets.
    pub fn market_count(&self) -> usize {
        self.quotes.len()
    }

    /// Returns whether the NBBO side changed.
    fn update_side(&mut self, side: Side, quote: &Quote) -> bool {
        let market = quote.market();
        let incoming = side_of(quote, side);
        let current = match side {
            Side::Buy => self.nbbo.bid().copied(),
            Side::Sell => self.nbbo.ask().copied(),
        };

        let new = match current {
            // The arriving market held the best price: adopt an improvement
            // in place, otherwise rescan every cached quote for the new best.
            Some(best) if best.market == market => {
                match incoming {
                    Some(q) if !worse(side, q.price, best.price) => Some(q),
                    _ => self.rescan(side),
                }
            }
            // Some other market is best; adopt only a strict improvement.
            Some(best) => match incoming {
                Some(q) if better(side, q.price, best.price) => Some(q),
                _ => Some(best),
            },
            None => incoming.or_else(|| self.rescan(side)),
        };

        let changed = new != current;
        match side {
            Side::Buy => self.nbbo = BestBidAsk::new(new, self.nbbo.ask().copied()),
            Side::Sell => self.nbbo = BestBidAsk::new(self.nbbo.bid().copied(), new),
        }
        changed
    }

    /// Full scan over the cached quotes for the best price on one side.
    fn rescan(&self, side: Side) -> Option<BestQuote> {
        let mut best: Option<BestQuote> = None;
        for quote in self.quotes.values() {
            if let Some(candidate) = side_of(quote, side) {
                best = match best {
                    Some(b) if !better(side, candidate.price, b.price) => Some(b),
                    _ => Some(candidate),
                };
            }
        }
        best
    }
}

fn side_of(quote: &Quote, side: Side) -> Option<BestQuote> {
    let (price, quantity) = match side {
        Side::Buy => (quote.bid_price(), quote.bid_quantity()),
        Side::Sell => (quote.ask_price(), quote.ask_quantity()),
    };
    price.map(|price| BestQuote {
        market: quote.market(),
        price,
        quantity,
    })
}

/// Strictly better price for the given side.
fn better(side: Side, candidate: Price, incumbent: Price) -> bool {
    match side {
        Side::Buy => candidate > incumbent,
        Side::Sell => candidate < incumbent,
    }
}

/// Strictly worse price for the given side.
fn worse(side: Side, candidate: Price, incumbent: Price) -> bool {
    match side {
        Side::Buy => candidate < incumbent,
        Side::Sell => candidate > incumbent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::time::MarketTime;

    const NYSE: MarketId = MarketId::of(0);
    const NASDAQ: MarketId = MarketId::of(1);

    fn quote(market: MarketId, bid: Option<i64>, ask: Option<i64>, time: i64, seq: u64) -> Quote {
        Quote::new(
            market,
            bid.map(Price::of),
            bid.map(|_| 1).unwrap_or(0),
            ask.map(Price::of),
            ask.map(|_| 1).unwrap_or(0),
            MarketTime::new(TimeStamp::of(time), seq),
        )
    }

    fn two_market_sip() -> Sip {
        let mut sip = Sip::new(TimeStamp::of(100));
        sip.track(NYSE);
        sip.track(NASDAQ);
        sip.process_quote(quote(NYSE, Some(80), Some(100), 10, 1));
        sip.process_quote(quote(NASDAQ, Some(70), Some(90), 10, 1));
        sip
    }

    #[test]
    fn test_nbbo_combines_markets() {
        let sip = two_market_sip();
        let nbbo = sip.nbbo();
        assert_eq!(nbbo.bid().unwrap().price, Price::of(80));
        assert_eq!(nbbo.bid().unwrap().market, NYSE);
        assert_eq!(nbbo.ask().unwrap().price, Price::of(90));
        assert_eq!(nbbo.ask().unwrap().market, NASDAQ);
    }

    #[test]
    fn test_best_market_regression_rescans() {
        let mut sip = two_market_sip();
        // NASDAQ held the best ask and worsens past NYSE's 100.
        let outcome = sip.process_quote(quote(NASDAQ, Some(70), Some(110), 20, 2));
        assert_eq!(outcome, SipOutcome::Updated);
        let nbbo = sip.nbbo();
        assert_eq!(nbbo.ask().unwrap().price, Price::of(100));
        assert_eq!(nbbo.ask().unwrap().market, NYSE);
        // The bid side is untouched.
        assert_eq!(nbbo.bid().unwrap().price, Price::of(80));
    }

    #[test]
    fn test_best_market_worsens_but_keeps_lead() {
        let mut sip = two_market_sip();
        let outcome = sip.process_quote(quote(NASDAQ, Some(70), Some(91), 20, 2));
        assert_eq!(outcome, SipOutcome::Updated);
        assert_eq!(sip.nbbo().ask().unwrap().price, Price::of(91));
        assert_eq!(sip.nbbo().ask().unwrap().market, NASDAQ);
    }

    #[test]
    fn test_non_best_market_worsening_is_noop() {
        let mut sip = two_market_sip();
        // NYSE does not hold the best ask; worsening it changes nothing.
        let outcome = sip.process_quote(quote(NYSE, Some(80), Some(105), 20, 2));
        assert_eq!(outcome, SipOutcome::Unchanged);
        assert_eq!(sip.nbbo().ask().unwrap().price, Price::of(90));
    }

    #[test]
    fn test_improvement_adopted() {
        let mut sip = two_market_sip();
        let outcome = sip.process_quote(quote(NYSE, Some(85), Some(100), 20, 2));
        assert_eq!(outcome, SipOutcome::Updated);
        assert_eq!(sip.nbbo().bid().unwrap().price, Price::of(85));
        assert_eq!(sip.nbbo().bid().unwrap().market, NYSE);
    }

    #[test]
    fn test_stale_quote_discarded() {
        let mut sip = two_market_sip();
        let before = sip.nbbo().clone();
        // Same market time as the applied quote: stale.
        let outcome = sip.process_quote(quote(NASDAQ, Some(99), Some(99), 10, 1));
        assert_eq!(outcome, SipOutcome::Stale);
        assert_eq!(sip.nbbo(), &before);
        // Strictly earlier: also stale.
        let outcome = sip.process_quote(quote(NASDAQ, Some(99), Some(99), 5, 0));
        assert_eq!(outcome, SipOutcome::Stale);
        assert_eq!(sip.nbbo(), &before);
    }

    #[test]
    fn test_side_going_absent_rescans() {
        let mut sip = two_market_sip();
        // NASDAQ's book empties on the ask side.
        sip.process_quote(quote(NASDAQ, Some(70), None, 20, 2));
        assert_eq!(sip.nbbo().ask().unwrap().price, Price::of(100));
        assert_eq!(sip.nbbo().ask().unwrap().market, NYSE);

        // NYSE's too: no ask remains anywhere.
        sip.process_quote(quote(NYSE, Some(80), None, 20, 2));
        assert!(sip.nbbo().ask().is_none());
        assert_eq!(sip.nbbo().bid().unwrap().price, Price::of(80));
    }

    #[test]
    fn test_untracked_market_starts_contributing_on_first_quote() {
        let mut sip = Sip::new(TimeStamp::of(100));
        sip.track(NYSE);
        assert_eq!(sip.nbbo(), &BestBidAsk::empty());

        sip.process_quote(quote(NYSE, Some(80), Some(100), 10, 1));
        assert_eq!(sip.nbbo().bid().unwrap().price, Price::of(80));
        assert_eq!(sip.market_count(), 1);
    }
}
