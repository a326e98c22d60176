//! Four-heap order book
//!
//! Maintains four priority queues — matched and unmatched orders on each
//! side — such that every matched buy prices at or above every matched
//! sell, unmatched orders never outrank matched ones, and total matched
//! quantity is balanced between the sides. Insertion re-matches
//! incrementally (matching against opposing unmatched orders first, then
//! displacing inferior matched orders); withdrawal re-balances by promoting
//! the next-best unmatched order or demoting the least competitive matched
//! one. Quotes come from the queue tops in O(log n).
//!
//! Orders live in an arena keyed by id; the queues hold pre-oriented rank
//! keys, so each queue's top is simply the first element of an ordered set.

use std::collections::{BTreeSet, HashMap};

use tracing::trace;
use types::errors::OrderError;
use types::ids::OrderId;
use types::numeric::Price;
use types::order::{OrderRef, Side};

use crate::matching::MatchedOrders;

/// A resident order: immutable identity plus the split between matched and
/// unmatched quantity. Both quantities are always non-negative and their
/// sum is positive while the order is resident.
#[derive(Debug, Clone)]
struct BookOrder {
    refer: OrderRef,
    matched: u64,
    unmatched: u64,
}

impl BookOrder {
    fn total(&self) -> u64 {
        self.matched + self.unmatched
    }
}

/// Priority rank of an order within one queue.
///
/// Components are pre-oriented at construction so that the tuple's natural
/// ordering puts the queue's head first; `first()` on the backing set is
/// the queue top. The order id breaks nothing — price and time already
/// totally order submissions — but keeps keys unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Rank {
    price: i64,
    time: i64,
    id: u64,
}

/// The four queues an order can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lane {
    BuyMatched,
    BuyUnmatched,
    SellMatched,
    SellUnmatched,
}

/// Rank of `order` within `lane`.
///
/// Unmatched queues are best-first (most competitive price, then earliest
/// submission); matched queues are worst-first (least competitive price,
/// then latest submission), so the top is the first candidate to displace.
fn rank(lane: Lane, order: &OrderRef) -> Rank {
    let price = order.price.ticks();
    let time = order.submitted.sequence() as i64;
    let id = order.id.value();
    match lane {
        Lane::BuyUnmatched => Rank { price: -price, time, id },
        Lane::SellUnmatched => Rank { price, time, id },
        Lane::BuyMatched => Rank { price, time: -time, id },
        Lane::SellMatched => Rank { price: -price, time: -time, id },
    }
}

/// (own matched, own unmatched, opposing matched, opposing unmatched)
fn lanes(side: Side) -> (Lane, Lane, Lane, Lane) {
    match side {
        Side::Buy => (
            Lane::BuyMatched,
            Lane::BuyUnmatched,
            Lane::SellMatched,
            Lane::SellUnmatched,
        ),
        Side::Sell => (
            Lane::SellMatched,
            Lane::SellUnmatched,
            Lane::BuyMatched,
            Lane::BuyUnmatched,
        ),
    }
}

/// Whether an order with `limit` on `side` can transact at an opposing
/// price.
fn crosses(side: Side, limit: Price, opposing: Price) -> bool {
    match side {
        Side::Buy => opposing <= limit,
        Side::Sell => opposing >= limit,
    }
}

/// The four-heap order book for a single market.
#[derive(Debug, Default)]
pub struct FourHeap {
    orders: HashMap<OrderId, BookOrder>,
    buy_matched: BTreeSet<Rank>,
    buy_unmatched: BTreeSet<Rank>,
    sell_matched: BTreeSet<Rank>,
    sell_unmatched: BTreeSet<Rank>,
}

impl FourHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an order with the given open quantity.
    ///
    /// Matches against the best opposing unmatched orders while prices
    /// cross, then displaces own-side matched orders it outranks, splitting
    /// quantities exactly so the matched sides stay balanced. Every piece
    /// keeps the parent order's identity and submission time.
    pub fn insert(&mut self, order: OrderRef, quantity: u64) -> Result<(), OrderError> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity);
        }
        if !order.price.is_finite() {
            return Err(OrderError::InvalidPrice);
        }
        if self.orders.contains_key(&order.id) {
            return Err(OrderError::AlreadyResident(order.id));
        }

        let side = order.side;
        let (own_matched_lane, own_unmatched_lane, opp_matched_lane, _) = lanes(side);
        let Self {
            orders,
            buy_matched,
            buy_unmatched,
            sell_matched,
            sell_unmatched,
        } = self;
        let (own_matched, own_unmatched, opp_matched, opp_unmatched) = match side {
            Side::Buy => (buy_matched, buy_unmatched, sell_matched, sell_unmatched),
            Side::Sell => (sell_matched, sell_unmatched, buy_matched, buy_unmatched),
        };

        let mut incoming = BookOrder {
            refer: order,
            matched: 0,
            unmatched: quantity,
        };

        // Re-run both match phases until no further crossing is possible:
        // displacing a matched order can unblock matching against opposing
        // unmatched liquidity that was previously behind it.
        while incoming.unmatched > 0 {
            let before = incoming.unmatched;

            // Match against opposing unmatched orders. The opposing top must
            // cross our limit, and must also be matchable against our own
            // worst matched order — otherwise the incoming order should
            // displace that one instead of consuming fresh liquidity.
            while incoming.unmatched > 0 {
                let Some(&opp_top) = opp_unmatched.first() else { break };
                let opp_id = OrderId::of(opp_top.id);
                let opp_price = orders[&opp_id].refer.price;
                if !crosses(side, order.price, opp_price) {
                    break;
                }
                if let Some(&own_top) = own_matched.first() {
                    let own_worst = orders[&OrderId::of(own_top.id)].refer.price;
                    if !crosses(side, own_worst, opp_price) {
                        break;
                    }
                }

                let opp = orders.get_mut(&opp_id).expect("rank without arena entry");
                if opp.matched == 0 {
                    opp_matched.insert(rank(opp_matched_lane, &opp.refer));
                }
                let moved = incoming.unmatched.min(opp.unmatched);
                incoming.unmatched -= moved;
                incoming.matched += moved;
                opp.unmatched -= moved;
                opp.matched += moved;
                if opp.unmatched == 0 {
                    opp_unmatched.remove(&opp_top);
                }
            }

            // Displace own matched orders this one outranks.
            while incoming.unmatched > 0 {
                let Some(&worst) = own_matched.first() else { break };
                if rank(own_matched_lane, &incoming.refer) <= worst {
                    break;
                }
                let worst_id = OrderId::of(worst.id);
                let displaced = orders.get_mut(&worst_id).expect("rank without arena entry");
                if displaced.unmatched == 0 {
                    own_unmatched.insert(rank(own_unmatched_lane, &displaced.refer));
                }
                let moved = incoming.unmatched.min(displaced.matched);
                incoming.unmatched -= moved;
                incoming.matched += moved;
                displaced.matched -= moved;
                displaced.unmatched += moved;
                if displaced.matched == 0 {
                    own_matched.remove(&worst);
                }
            }

            if incoming.unmatched == before {
                break;
            }
        }

        if incoming.unmatched > 0 {
            own_unmatched.insert(rank(own_unmatched_lane, &incoming.refer));
        }
        if incoming.matched > 0 {
            own_matched.insert(rank(own_matched_lane, &incoming.refer));
        }
        orders.insert(order.id, incoming);

        debug_assert!(self.invariants_hold());
        Ok(())
    }

    /// Withdraw up to `quantity` from a resident order.
    ///
    /// Unmatched quantity is removed first. Removing matched quantity
    /// re-balances the book: the best own-side unmatched orders that still
    /// cross are promoted into the matched set, and any remainder demotes
    /// the least competitive opposing matched orders back to unmatched.
    ///
    /// Returns the quantity actually withdrawn (capped at the order's open
    /// quantity). Withdrawing an unknown order is an explicit error, never
    /// silent corruption.
    pub fn withdraw(&mut self, id: OrderId, quantity: u64) -> Result<u64, OrderError> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity);
        }
        let Some(entry) = self.orders.get(&id) else {
            return Err(OrderError::NotFound(id));
        };
        let side = entry.refer.side;
        let requested = quantity.min(entry.total());

        let (own_matched_lane, own_unmatched_lane, _, opp_unmatched_lane) = lanes(side);
        let Self {
            orders,
            buy_matched,
            buy_unmatched,
            sell_matched,
            sell_unmatched,
        } = self;
        let (own_matched, own_unmatched, opp_matched, opp_unmatched) = match side {
            Side::Buy => (buy_matched, buy_unmatched, sell_matched, sell_unmatched),
            Side::Sell => (sell_matched, sell_unmatched, buy_matched, buy_unmatched),
        };

        let mut remaining = requested;

        // Unmatched quantity goes first.
        {
            let entry = orders.get_mut(&id).expect("entry checked above");
            let take = remaining.min(entry.unmatched);
            if take > 0 {
                entry.unmatched -= take;
                remaining -= take;
                if entry.unmatched == 0 {
                    own_unmatched.remove(&rank(own_unmatched_lane, &entry.refer));
                }
            }
        }

        // Refill the matched set from our own unmatched orders that still
        // cross the worst matched opposing order.
        while remaining > 0 {
            let Some(&cand_rank) = own_unmatched.first() else { break };
            let Some(&opp_worst) = opp_matched.first() else { break };
            let cand_id = OrderId::of(cand_rank.id);
            let cand_price = orders[&cand_id].refer.price;
            let opp_worst_price = orders[&OrderId::of(opp_worst.id)].refer.price;
            if !crosses(side, cand_price, opp_worst_price) {
                break;
            }

            let cand = orders.get_mut(&cand_id).expect("rank without arena entry");
            if cand.matched == 0 {
                own_matched.insert(rank(own_matched_lane, &cand.refer));
            }
            let moved = remaining.min(cand.unmatched);
            cand.matched += moved;
            cand.unmatched -= moved;
            if cand.unmatched == 0 {
                own_unmatched.remove(&cand_rank);
            }

            let entry = orders.get_mut(&id).expect("entry checked above");
            entry.matched -= moved;
            remaining -= moved;
        }

        // Whatever matched quantity is left unbalances the opposing side;
        // demote its least competitive matched orders back to unmatched.
        while remaining > 0 {
            let &opp_worst = opp_matched
                .first()
                .expect("matched quantities out of balance");
            let opp_id = OrderId::of(opp_worst.id);
            let opp = orders.get_mut(&opp_id).expect("rank without arena entry");
            if opp.unmatched == 0 {
                opp_unmatched.insert(rank(opp_unmatched_lane, &opp.refer));
            }
            let moved = remaining.min(opp.matched);
            opp.matched -= moved;
            opp.unmatched += moved;
            if opp.matched == 0 {
                opp_matched.remove(&opp_worst);
            }

            let entry = orders.get_mut(&id).expect("entry checked above");
            entry.matched -= moved;
            remaining -= moved;
        }

        let entry = orders.get_mut(&id).expect("entry checked above");
        if entry.matched == 0 {
            own_matched.remove(&rank(own_matched_lane, &entry.refer));
        }
        if entry.total() == 0 {
            orders.remove(&id);
        }

        debug_assert!(self.invariants_hold());
        Ok(requested)
    }

    /// Extract all currently matched quantity as buy/sell pairings.
    ///
    /// Both matched sides are consumed best-first (price, then earliest
    /// submission), pairing greedily at the minimum of the two remaining
    /// quantities. Orders left with only unmatched quantity stay resident;
    /// fully consumed orders leave the book.
    pub fn market_clear(&mut self) -> Vec<MatchedOrders> {
        // Worst-first sets reversed give best-first extraction order.
        let buys: Vec<OrderId> = self
            .buy_matched
            .iter()
            .rev()
            .map(|r| OrderId::of(r.id))
            .collect();
        let sells: Vec<OrderId> = self
            .sell_matched
            .iter()
            .rev()
            .map(|r| OrderId::of(r.id))
            .collect();

        let mut pairs = Vec::new();
        let mut sell_iter = sells.iter();
        let mut current_sell: Option<(OrderRef, u64)> = None;
        for buy_id in &buys {
            let buy_ref = self.orders[buy_id].refer;
            let mut buy_left = self.orders[buy_id].matched;
            while buy_left > 0 {
                if current_sell.as_ref().map_or(true, |(_, q)| *q == 0) {
                    let sell_id = sell_iter.next().expect("matched quantities out of balance");
                    let sell = &self.orders[sell_id];
                    current_sell = Some((sell.refer, sell.matched));
                }
                let (sell_ref, sell_left) = current_sell.as_mut().expect("just refilled");
                let quantity = buy_left.min(*sell_left);
                pairs.push(MatchedOrders::new(buy_ref, *sell_ref, quantity));
                buy_left -= quantity;
                *sell_left -= quantity;
            }
        }
        debug_assert!(
            current_sell.as_ref().map_or(true, |(_, q)| *q == 0) && sell_iter.next().is_none(),
            "matched quantities out of balance"
        );

        for id in buys.iter().chain(sells.iter()) {
            let entry = self.orders.get_mut(id).expect("rank without arena entry");
            entry.matched = 0;
            if entry.unmatched == 0 {
                self.orders.remove(id);
            }
        }
        self.buy_matched.clear();
        self.sell_matched.clear();

        trace!(pairs = pairs.len(), "book cleared");
        debug_assert!(self.invariants_hold());
        pairs
    }

    /// The bid quote: the price at which a new marginal sell order is
    /// guaranteed to transact. Absent when no order informs it.
    pub fn bid_quote(&self) -> Option<Price> {
        let matched_sell = self.peek_price(&self.sell_matched);
        let unmatched_buy = self.peek_price(&self.buy_unmatched);
        match (matched_sell, unmatched_buy) {
            (None, None) => None,
            (Some(p), None) | (None, Some(p)) => Some(p),
            (Some(a), Some(b)) => Some(a.max(b)),
        }
    }

    /// The ask quote: the price at which a new marginal buy order is
    /// guaranteed to transact. Absent when no order informs it.
    pub fn ask_quote(&self) -> Option<Price> {
        let matched_buy = self.peek_price(&self.buy_matched);
        let unmatched_sell = self.peek_price(&self.sell_unmatched);
        match (matched_buy, unmatched_sell) {
            (None, None) => None,
            (Some(p), None) | (None, Some(p)) => Some(p),
            (Some(a), Some(b)) => Some(a.min(b)),
        }
    }

    /// Identity of a resident order.
    pub fn order(&self, id: OrderId) -> Option<&OrderRef> {
        self.orders.get(&id).map(|o| &o.refer)
    }

    /// Open (matched + unmatched) quantity of a resident order, zero when
    /// absent.
    pub fn open_quantity(&self, id: OrderId) -> u64 {
        self.orders.get(&id).map(|o| o.total()).unwrap_or(0)
    }

    pub fn contains(&self, id: OrderId) -> bool {
        self.orders.contains_key(&id)
    }

    /// Number of resident orders (not quantity-weighted).
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Total resting quantity across all four queues.
    pub fn total_quantity(&self) -> u64 {
        self.orders.values().map(|o| o.total()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    fn peek_price(&self, queue: &BTreeSet<Rank>) -> Option<Price> {
        queue
            .first()
            .map(|r| self.orders[&OrderId::of(r.id)].refer.price)
    }

    /// Structural invariants; checked after every mutation in debug builds.
    fn invariants_hold(&self) -> bool {
        let mut matched_buy_qty: u64 = 0;
        let mut matched_sell_qty: u64 = 0;
        let mut min_matched_buy: Option<Price> = None;
        let mut max_matched_sell: Option<Price> = None;
        let mut max_unmatched_buy: Option<Price> = None;
        let mut min_unmatched_sell: Option<Price> = None;
        let mut counts = [0usize; 4];

        for order in self.orders.values() {
            if order.total() == 0 {
                return false; // consumed orders must leave the arena
            }
            let price = order.refer.price;
            match order.refer.side {
                Side::Buy => {
                    if order.matched > 0 {
                        matched_buy_qty += order.matched;
                        min_matched_buy = Some(min_matched_buy.map_or(price, |p| p.min(price)));
                        counts[0] += 1;
                    }
                    if order.unmatched > 0 {
                        max_unmatched_buy = Some(max_unmatched_buy.map_or(price, |p| p.max(price)));
                        counts[1] += 1;
                    }
                }
                Side::Sell => {
                    if order.matched > 0 {
                        matched_sell_qty += order.matched;
                        max_matched_sell = Some(max_matched_sell.map_or(price, |p| p.max(price)));
                        counts[2] += 1;
                    }
                    if order.unmatched > 0 {
                        min_unmatched_sell =
                            Some(min_unmatched_sell.map_or(price, |p| p.min(price)));
                        counts[3] += 1;
                    }
                }
            }
        }

        let le = |a: Option<Price>, b: Option<Price>| match (a, b) {
            (Some(a), Some(b)) => a <= b,
            _ => true,
        };
        let lt = |a: Option<Price>, b: Option<Price>| match (a, b) {
            (Some(a), Some(b)) => a < b,
            _ => true,
        };

        matched_buy_qty == matched_sell_qty
            // matched sides are crossed
            && le(max_matched_sell, min_matched_buy)
            // no unmatched order outranks a matched one on its side
            && le(max_unmatched_buy, min_matched_buy)
            && le(max_matched_sell, min_unmatched_sell)
            // unmatched sides must not cross each other
            && lt(max_unmatched_buy, min_unmatched_sell)
            // queue membership mirrors the arena
            && counts
                == [
                    self.buy_matched.len(),
                    self.buy_unmatched.len(),
                    self.sell_matched.len(),
                    self.sell_unmatched.len(),
                ]
    }
}
