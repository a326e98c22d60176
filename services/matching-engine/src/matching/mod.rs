//! Matched order pairs produced by the book's clearing step

pub mod matched;

pub use matched::MatchedOrders;
