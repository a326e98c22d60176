//! Activity kinds executed on the timeline
//!
//! Activities are plain data; a single dispatch function on the simulation
//! executes them against the component handles. An executing activity may
//! schedule further activities, but their effects become visible only when
//! the timeline pops them — never synchronously.

use types::ids::{AgentId, MarketId, OrderId};
use types::numeric::Price;
use types::order::Side;
use types::quote::Quote;

/// One unit of executable behavior, enqueued on the timeline and executed
/// at most once.
#[derive(Debug, Clone, PartialEq)]
pub enum Activity {
    /// Deliver an order to a market's book.
    SubmitOrder {
        market: MarketId,
        order: OrderId,
        agent: AgentId,
        side: Side,
        price: Price,
        quantity: u64,
    },
    /// Deliver an order subject to best-execution routing: the receiving
    /// market checks the arrived NBBO and may forward the order to a market
    /// displaying a better price.
    SubmitNmsOrder {
        market: MarketId,
        order: OrderId,
        agent: AgentId,
        side: Side,
        price: Price,
        quantity: u64,
    },
    /// Withdraw open quantity from a resting order.
    WithdrawOrder {
        market: MarketId,
        order: OrderId,
        quantity: u64,
    },
    /// Clear a call market's accumulated book.
    Clear { market: MarketId },
    /// Deliver a market's quote to the information processor.
    PublishQuote { market: MarketId, quote: Quote },
}
