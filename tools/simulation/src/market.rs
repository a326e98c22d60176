//! Market: order book, pricing, quote publication, transaction log
//!
//! A market owns one four-heap book and one pricing policy. Continuous
//! markets clear after every accepted order; call markets clear only when
//! their scheduled clear activity fires. Every book mutation recomputes the
//! quote and schedules a latency-delayed publication to the information
//! processor, so downstream consumers only ever see the past.

use std::collections::BTreeMap;

use matching_engine::{FourHeap, PricingPolicy};
use tracing::{debug, info};
use types::errors::OrderError;
use types::ids::{AgentId, MarketId, OrderId};
use types::numeric::Price;
use types::order::{OrderRef, Side};
use types::quote::Quote;
use types::time::{MarketTime, TimeStamp};
use types::trade::Transaction;

use crate::activity::Activity;
use crate::config::{MarketConfig, MarketKind};
use crate::timeline::Timeline;

/// One market in a simulation run.
#[derive(Debug)]
pub struct Market {
    id: MarketId,
    kind: MarketKind,
    book: FourHeap,
    pricing: PricingPolicy,
    /// Communication delay between agents and this market; routed orders
    /// pay it on arrival.
    latency: TimeStamp,
    /// Delay before a quote update reaches the information processor.
    sip_latency: TimeStamp,
    /// Monotonic counter stamping every market action; combined with the
    /// clock it forms the MarketTime tie-break key.
    market_seq: u64,
    quote: Quote,
    transactions: Vec<Transaction>,
    /// Resting quantity per limit price, for quote quantities.
    bid_depth: BTreeMap<Price, u64>,
    ask_depth: BTreeMap<Price, u64>,
}

impl Market {
    pub fn new(id: MarketId, config: MarketConfig, sip_latency: TimeStamp) -> Self {
        Self {
            id,
            kind: config.kind,
            book: FourHeap::new(),
            pricing: config.pricing,
            latency: config.latency,
            sip_latency,
            market_seq: 0,
            quote: Quote::empty(id),
            transactions: Vec::new(),
            bid_depth: BTreeMap::new(),
            ask_depth: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> MarketId {
        self.id
    }

    pub fn kind(&self) -> MarketKind {
        self.kind
    }

    /// Communication delay between agents and this market.
    pub fn latency(&self) -> TimeStamp {
        self.latency
    }

    /// The market's own, perfectly current quote.
    pub fn quote(&self) -> &Quote {
        &self.quote
    }

    /// All transactions in execution order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Accept an order into the book. A continuous market clears at once;
    /// a call market lets it accumulate for the next scheduled clear.
    pub fn submit_order(
        &mut self,
        timeline: &mut Timeline<Activity>,
        order: OrderId,
        agent: AgentId,
        side: Side,
        price: Price,
        quantity: u64,
        now: TimeStamp,
    ) -> Result<(), OrderError> {
        self.market_seq += 1;
        let refer = OrderRef::new(order, agent, side, price, MarketTime::new(now, self.market_seq));
        self.book.insert(refer, quantity)?;
        debug!(market = %self.id, %order, %agent, ?side, %price, quantity, "order accepted");

        self.add_depth(side, price, quantity);
        match self.kind {
            MarketKind::Cda => self.clear(timeline, now),
            MarketKind::Call { .. } => self.update_quote(timeline, now),
        }
        Ok(())
    }

    /// Withdraw up to `quantity` from a resting order. Unknown orders are
    /// an explicit error; the caller decides whether that matters.
    pub fn withdraw_order(
        &mut self,
        timeline: &mut Timeline<Activity>,
        order: OrderId,
        quantity: u64,
        now: TimeStamp,
    ) -> Result<u64, OrderError> {
        self.market_seq += 1;
        let (side, price) = match self.book.order(order) {
            Some(refer) => (refer.side, refer.price),
            None => return Err(OrderError::NotFound(order)),
        };
        let withdrawn = self.book.withdraw(order, quantity)?;
        debug!(market = %self.id, %order, withdrawn, "order withdrawn");

        self.remove_depth(side, price, withdrawn);
        self.update_quote(timeline, now);
        Ok(withdrawn)
    }

    /// Clear the book: price all matched pairs, record the transactions,
    /// and publish the new quote.
    pub fn clear(&mut self, timeline: &mut Timeline<Activity>, now: TimeStamp) {
        self.market_seq += 1;
        let pairs = self.book.market_clear();
        let prices = self.pricing.price(&pairs);
        for (pair, price) in pairs.iter().zip(prices) {
            let transaction = Transaction::new(*pair.buy(), *pair.sell(), pair.quantity(), price, now);
            self.remove_depth(Side::Buy, pair.buy().price, pair.quantity());
            self.remove_depth(Side::Sell, pair.sell().price, pair.quantity());
            info!(market = %self.id, %transaction, "cleared");
            self.transactions.push(transaction);
        }
        self.update_quote(timeline, now);
    }

    /// Scheduled clear for a call market; reschedules itself at the
    /// configured interval.
    pub fn scheduled_clear(&mut self, timeline: &mut Timeline<Activity>, now: TimeStamp) {
        self.clear(timeline, now);
        if let MarketKind::Call { clear_interval } = self.kind {
            timeline.schedule_in(clear_interval, Activity::Clear { market: self.id });
        }
    }

    /// Recompute the quote from the book and schedule its latency-delayed
    /// delivery to the information processor.
    fn update_quote(&mut self, timeline: &mut Timeline<Activity>, now: TimeStamp) {
        self.market_seq += 1;
        let bid = self.book.bid_quote();
        let ask = self.book.ask_quote();
        let bid_quantity = bid.and_then(|p| self.bid_depth.get(&p)).copied().unwrap_or(0);
        let ask_quantity = ask.and_then(|p| self.ask_depth.get(&p)).copied().unwrap_or(0);
        self.quote = Quote::new(
            self.id,
            bid,
            bid_quantity,
            ask,
            ask_quantity,
            MarketTime::new(now, self.market_seq),
        );
        debug!(market = %self.id, quote = %self.quote, "quote updated");
        timeline.schedule_in(
            self.sip_latency,
            Activity::PublishQuote {
                market: self.id,
                quote: self.quote.clone(),
            },
        );
    }

    fn add_depth(&mut self, side: Side, price: Price, quantity: u64) {
        let depth = match side {
            Side::Buy => &mut self.bid_depth,
            Side::Sell => &mut self.ask_depth,
        };
        *depth.entry(price).or_insert(0) += quantity;
    }

    fn remove_depth(&mut self, side: Side, price: Price, quantity: u64) {
        let depth = match side {
            Side::Buy => &mut self.bid_depth,
            Side::Sell => &mut self.ask_depth,
        };
        let remaining = depth
            .get_mut(&price)
            .expect("depth bookkeeping out of sync");
        assert!(*remaining >= quantity, "depth bookkeeping out of sync");
        *remaining -= quantity;
        if *remaining == 0 {
            depth.remove(&price);
        }
    }
}

/// Restartable cursor over a market's transaction log.
///
/// Remembers how far the consumer has read, so repeated polling costs
/// amortized constant time rather than rescanning the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionReader {
    offset: usize,
}

impl TransactionReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transactions recorded since the previous read.
    pub fn read<'a>(&mut self, market: &'a Market) -> &'a [Transaction] {
        let log = market.transactions();
        let start = self.offset.min(log.len());
        self.offset = log.len();
        &log[start..]
    }

    /// Restart from the beginning of the log.
    pub fn rewind(&mut self) {
        self.offset = 0;
    }
}
