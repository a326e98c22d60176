//! Typed simulation configuration
//!
//! Plain structs handed to the simulation constructor; whatever loads them
//! (files, CLI, test code) is outside the core. Validation runs once at
//! startup and configuration errors propagate to the driver.

use matching_engine::PricingPolicy;
use serde::{Deserialize, Serialize};
use types::errors::ConfigError;
use types::time::TimeStamp;

/// How a market clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketKind {
    /// Continuous double auction: clears after every accepted order.
    Cda,
    /// Call market: clears only at the scheduled interval.
    Call { clear_interval: TimeStamp },
}

/// Configuration for one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    pub kind: MarketKind,
    pub pricing: PricingPolicy,
    /// Communication delay between agents and this market. An order routed
    /// here from another market pays this delay on arrival.
    pub latency: TimeStamp,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            kind: MarketKind::Cda,
            pricing: PricingPolicy::EarliestPrice { tick_size: 1 },
            latency: TimeStamp::ZERO,
        }
    }
}

impl MarketConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pricing.validate()?;
        if let MarketKind::Call { clear_interval } = self.kind {
            if clear_interval.is_immediate() || clear_interval == TimeStamp::ZERO {
                return Err(ConfigError::InvalidClearInterval);
            }
        }
        Ok(())
    }
}

/// Configuration for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Seed for the run's only random generator.
    pub seed: u64,
    /// Delay between a market quote update and its arrival at the SIP.
    pub sip_latency: TimeStamp,
    pub markets: Vec<MarketConfig>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            sip_latency: TimeStamp::ZERO,
            markets: vec![MarketConfig::default()],
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for market in &self.markets {
            market.validate()?;
        }
        Ok(())
    }
}
