//! Error taxonomy for the simulator
//!
//! Precondition violations are rejected synchronously at the call boundary
//! and have no effect; stale market data is silently discarded where it
//! arrives; invariant violations inside the core are asserts, not errors.

use crate::ids::{MarketId, OrderId};
use thiserror::Error;

/// Errors raised at the order-entry boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("order quantity must be positive")]
    InvalidQuantity,

    #[error("order price must be finite")]
    InvalidPrice,

    #[error("order not found: {0}")]
    NotFound(OrderId),

    #[error("order already resident in the book: {0}")]
    AlreadyResident(OrderId),
}

/// Errors raised when validating a simulation configuration at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tick size must be positive, got {0}")]
    InvalidTickSize(i64),

    #[error("uniform price ratio must be within [0, 1], got {0}")]
    InvalidRatio(String),

    #[error("call market clearing interval must be a positive number of ticks")]
    InvalidClearInterval,
}

/// Top-level simulator error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("order error: {0}")]
    Order(#[from] OrderError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("unknown market: {0}")]
    UnknownMarket(MarketId),
}
