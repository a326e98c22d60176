//! Matching Engine
//!
//! Order matching for the market simulator, built around the four-heap
//! order book: four priority structures that keep matched and unmatched
//! buy and sell orders separated, produce valid quotes in constant time,
//! and re-match incrementally on every insertion and withdrawal.
//!
//! **Key Invariants:**
//! - Every matched buy prices at or above every matched sell
//! - Unmatched orders never outrank matched orders on their own side
//! - Total matched buy quantity equals total matched sell quantity
//! - Price ties break by submission time, never nondeterministically

pub mod book;
pub mod clearing;
pub mod matching;

pub use book::FourHeap;
pub use clearing::PricingPolicy;
pub use matching::MatchedOrders;
