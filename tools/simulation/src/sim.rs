//! Simulation driver facade
//!
//! Owns the timeline, the markets, and the information processor, and
//! executes activities against them. Order entry validates preconditions
//! synchronously, then enqueues an immediate activity; all state mutation
//! happens while handling one activity at a time, so nothing in the core
//! ever observes a half-applied step.

use market_data::Sip;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use types::errors::{OrderError, SimError};
use types::ids::{AgentId, MarketId, OrderId};
use types::numeric::Price;
use types::order::Side;
use types::quote::BestBidAsk;
use types::time::TimeStamp;
use types::trade::Transaction;

use crate::activity::Activity;
use crate::config::{MarketKind, SimConfig};
use crate::market::Market;
use crate::timeline::Timeline;

/// One simulation run: markets, information processor, and the event
/// timeline that sequences everything.
#[derive(Debug)]
pub struct Simulation {
    timeline: Timeline<Activity>,
    markets: Vec<Market>,
    sip: Sip,
    next_order_id: u64,
}

impl Simulation {
    /// Build a run from a validated configuration. The seed is the run's
    /// only entropy source.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let mut timeline = Timeline::new(ChaCha8Rng::seed_from_u64(config.seed));
        let sip_latency = config.sip_latency;
        let mut sip = Sip::new(sip_latency);
        let mut markets = Vec::with_capacity(config.markets.len());
        for (index, market_config) in config.markets.into_iter().enumerate() {
            let id = MarketId::of(index as u32);
            sip.track(id);
            if let MarketKind::Call { clear_interval } = market_config.kind {
                timeline.schedule_in(clear_interval, Activity::Clear { market: id });
            }
            markets.push(Market::new(id, market_config, sip_latency));
        }
        Ok(Self {
            timeline,
            markets,
            sip,
            next_order_id: 0,
        })
    }

    /// Submit a limit order to a market. Returns the order's id; the order
    /// itself executes when the timeline next runs.
    pub fn submit_order(
        &mut self,
        market: MarketId,
        agent: AgentId,
        side: Side,
        price: Price,
        quantity: u64,
    ) -> Result<OrderId, SimError> {
        self.check_order(market, price, quantity)?;
        let order = self.allocate_order_id();
        self.timeline.schedule_in(
            TimeStamp::IMMEDIATE,
            Activity::SubmitOrder {
                market,
                order,
                agent,
                side,
                price,
                quantity,
            },
        );
        Ok(order)
    }

    /// Submit an order subject to best-execution routing against the
    /// arrived NBBO.
    pub fn submit_nms_order(
        &mut self,
        market: MarketId,
        agent: AgentId,
        side: Side,
        price: Price,
        quantity: u64,
    ) -> Result<OrderId, SimError> {
        self.check_order(market, price, quantity)?;
        let order = self.allocate_order_id();
        self.timeline.schedule_in(
            TimeStamp::IMMEDIATE,
            Activity::SubmitNmsOrder {
                market,
                order,
                agent,
                side,
                price,
                quantity,
            },
        );
        Ok(order)
    }

    /// Withdraw open quantity from an order. Withdrawing an order that has
    /// already filled by the time the activity runs is a no-op.
    pub fn withdraw_order(
        &mut self,
        market: MarketId,
        order: OrderId,
        quantity: u64,
    ) -> Result<(), SimError> {
        self.check_market(market)?;
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity.into());
        }
        self.timeline.schedule_in(
            TimeStamp::IMMEDIATE,
            Activity::WithdrawOrder {
                market,
                order,
                quantity,
            },
        );
        Ok(())
    }

    /// Schedule an activity `delay` from now. Driver surface for scripted
    /// scenarios and latency-delayed agent behavior.
    pub fn schedule_in(&mut self, delay: TimeStamp, activity: Activity) {
        self.timeline.schedule_in(delay, activity);
    }

    /// Execute every activity due at or before `target`, then advance the
    /// clock to it. Immediate activities always drain completely.
    pub fn execute_until(&mut self, target: TimeStamp) {
        while self.timeline.has_work_through(target) {
            let (now, activity) = self
                .timeline
                .pop()
                .expect("timeline reported work but returned none");
            self.execute(activity, now);
        }
        self.timeline.advance_to(target);
    }

    pub fn current_time(&self) -> TimeStamp {
        self.timeline.current_time()
    }

    /// A market's own, perfectly current quote.
    pub fn quote(&self, market: MarketId) -> Result<&types::quote::Quote, SimError> {
        self.market(market).map(Market::quote)
    }

    /// A market's transaction log in execution order.
    pub fn transactions(&self, market: MarketId) -> Result<&[Transaction], SimError> {
        self.market(market).map(Market::transactions)
    }

    /// The NBBO as the information processor has seen it so far.
    pub fn nbbo(&self) -> &BestBidAsk {
        self.sip.nbbo()
    }

    pub fn market_count(&self) -> usize {
        self.markets.len()
    }

    fn market(&self, id: MarketId) -> Result<&Market, SimError> {
        self.markets
            .get(id.value() as usize)
            .ok_or(SimError::UnknownMarket(id))
    }

    fn check_market(&self, id: MarketId) -> Result<(), SimError> {
        self.market(id).map(|_| ())
    }

    fn check_order(&self, market: MarketId, price: Price, quantity: u64) -> Result<(), SimError> {
        self.check_market(market)?;
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity.into());
        }
        if !price.is_finite() {
            return Err(OrderError::InvalidPrice.into());
        }
        Ok(())
    }

    fn allocate_order_id(&mut self) -> OrderId {
        self.next_order_id += 1;
        OrderId::of(self.next_order_id)
    }

    /// Execute one activity. Activities carry only data; every effect goes
    /// through the explicit component handles here.
    fn execute(&mut self, activity: Activity, now: TimeStamp) {
        match activity {
            Activity::SubmitOrder {
                market,
                order,
                agent,
                side,
                price,
                quantity,
            } => {
                let Self {
                    timeline, markets, ..
                } = self;
                markets
                    .get_mut(market.value() as usize)
                    .expect("unknown market in activity")
                    .submit_order(timeline, order, agent, side, price, quantity, now)
                    .expect("order validated at the boundary");
            }
            Activity::SubmitNmsOrder {
                market,
                order,
                agent,
                side,
                price,
                quantity,
            } => {
                let target = self.route(market, side, price);
                if target == market {
                    self.execute(
                        Activity::SubmitOrder {
                            market,
                            order,
                            agent,
                            side,
                            price,
                            quantity,
                        },
                        now,
                    );
                } else {
                    info!(%order, from = %market, to = %target, %price, "routed to better displayed price");
                    // Reaching the other market costs that market's
                    // communication latency.
                    let latency = self
                        .markets
                        .get(target.value() as usize)
                        .expect("routed to unknown market")
                        .latency();
                    self.timeline.schedule_in(
                        latency,
                        Activity::SubmitOrder {
                            market: target,
                            order,
                            agent,
                            side,
                            price,
                            quantity,
                        },
                    );
                }
            }
            Activity::WithdrawOrder {
                market,
                order,
                quantity,
            } => {
                let Self {
                    timeline, markets, ..
                } = self;
                let result = markets
                    .get_mut(market.value() as usize)
                    .expect("unknown market in activity")
                    .withdraw_order(timeline, order, quantity, now);
                match result {
                    Ok(_) => {}
                    // The order filled or was withdrawn before this ran.
                    Err(OrderError::NotFound(_)) => {
                        debug!(%order, "withdrawal found no resting order");
                    }
                    Err(err) => panic!("withdrawal failed: {err}"),
                }
            }
            Activity::Clear { market } => {
                let Self {
                    timeline, markets, ..
                } = self;
                markets
                    .get_mut(market.value() as usize)
                    .expect("unknown market in activity")
                    .scheduled_clear(timeline, now);
            }
            Activity::PublishQuote { market: _, quote } => {
                self.sip.process_quote(quote);
            }
        }
    }

    /// Pick the market an order should execute at: the submission market
    /// unless the arrived NBBO shows a strictly better price elsewhere that
    /// the order's limit would transact against. Stale NBBO information
    /// routes accordingly — latency arbitrage is part of the model.
    fn route(&self, local: MarketId, side: Side, price: Price) -> MarketId {
        let nbbo = self.sip.nbbo();
        let quote = self.markets[local.value() as usize].quote();
        match side {
            Side::Buy => {
                let nbbo_ask = nbbo.ask_price_or_inf();
                let local_ask = quote.ask_price().unwrap_or(Price::INF);
                if nbbo_ask < local_ask && price >= nbbo_ask {
                    nbbo.ask().map(|a| a.market).unwrap_or(local)
                } else {
                    local
                }
            }
            Side::Sell => {
                let nbbo_bid = nbbo.bid_price_or_neg_inf();
                let local_bid = quote.bid_price().unwrap_or(Price::NEG_INF);
                if nbbo_bid > local_bid && price <= nbbo_bid {
                    nbbo.bid().map(|b| b.market).unwrap_or(local)
                } else {
                    local
                }
            }
        }
    }
}
