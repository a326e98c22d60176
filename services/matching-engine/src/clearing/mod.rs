//! Clearing price policies
//!
//! A pricing policy is a pure function from a batch of matched pairs to an
//! execution price per pair. `EarliestPrice` is the continuous-auction rule
//! (the order that arrived first sets the price); `UniformPrice` is the call
//! auction rule (one batch-wide price interpolated between the tightest
//! crossing prices).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::errors::ConfigError;
use types::numeric::Price;

use crate::matching::MatchedOrders;

/// Execution pricing for a batch of matched pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricingPolicy {
    /// Each pair clears at the limit price of whichever of its two orders
    /// was submitted earlier, quantized to the tick size.
    EarliestPrice { tick_size: i64 },

    /// Every pair in the batch clears at the single price
    /// `min_buy * ratio + max_sell * (1 - ratio)`, where `min_buy` and
    /// `max_sell` are taken over the whole batch, quantized to the tick
    /// size. `ratio` = 1 favors the buy price, 0 the sell price.
    UniformPrice { ratio: Decimal, tick_size: i64 },
}

impl PricingPolicy {
    /// Validate constructor parameters; surfaced at configuration time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tick_size = match self {
            PricingPolicy::EarliestPrice { tick_size } => *tick_size,
            PricingPolicy::UniformPrice { ratio, tick_size } => {
                if *ratio < Decimal::ZERO || *ratio > Decimal::ONE {
                    return Err(ConfigError::InvalidRatio(ratio.to_string()));
                }
                *tick_size
            }
        };
        if tick_size <= 0 {
            return Err(ConfigError::InvalidTickSize(tick_size));
        }
        Ok(())
    }

    /// Price every pair in the batch, in batch order. Deterministic and
    /// side-effect free; an empty batch prices to an empty vec.
    pub fn price(&self, pairs: &[MatchedOrders]) -> Vec<Price> {
        match self {
            PricingPolicy::EarliestPrice { tick_size } => pairs
                .iter()
                .map(|pair| {
                    let earlier = if pair.buy().submitted <= pair.sell().submitted {
                        pair.buy()
                    } else {
                        pair.sell()
                    };
                    earlier.price.quantize(*tick_size)
                })
                .collect(),
            PricingPolicy::UniformPrice { ratio, tick_size } => {
                if pairs.is_empty() {
                    return Vec::new();
                }
                let min_buy = pairs
                    .iter()
                    .map(|pair| pair.buy().price)
                    .min()
                    .expect("batch is nonempty");
                let max_sell = pairs
                    .iter()
                    .map(|pair| pair.sell().price)
                    .max()
                    .expect("batch is nonempty");
                let interpolated = min_buy.as_decimal() * ratio
                    + max_sell.as_decimal() * (Decimal::ONE - ratio);
                let ticks = interpolated
                    .round()
                    .to_i64()
                    .expect("interpolated price fits in ticks");
                let price = Price::of(ticks).quantize(*tick_size);
                vec![price; pairs.len()]
            }
        }
    }
}
