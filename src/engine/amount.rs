//! Transfer amount and delay selection.
//!
//! Amounts are drawn in whole cents inside the configured USD band so every
//! transfer looks like a hand-typed figure; the draw is capped by what the
//! source network actually holds.

use alloy::primitives::U256;
use rand::Rng;
use std::time::Duration;

use crate::config::BotConfig;
use crate::types::cents_to_units;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountSelector {
    min_cents: u64,
    max_cents: u64,
    decimals: u8,
}

impl AmountSelector {
    pub fn new(min_cents: u64, max_cents: u64, decimals: u8) -> Self {
        Self {
            min_cents,
            max_cents: max_cents.max(min_cents),
            decimals,
        }
    }

    pub fn from_config(cfg: &BotConfig) -> Self {
        let (min, max) = cfg.cents_band();
        Self::new(min, max, cfg.token_decimals)
    }

    /// Minimum transfer in the token's smallest unit.
    pub fn min_units(&self) -> U256 {
        cents_to_units(self.min_cents, self.decimals)
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Uniform draw over `[min_cents, max_cents]`, clamped to `balance`.
    pub fn pick<R: Rng>(&self, balance: U256, rng: &mut R) -> U256 {
        let cents = rng.gen_range(self.min_cents..=self.max_cents);
        cents_to_units(cents, self.decimals).min(balance)
    }
}

/// Whole-minute delay drawn uniformly from `[min_minutes, max_minutes]`.
pub fn pick_delay<R: Rng>(min_minutes: u64, max_minutes: u64, rng: &mut R) -> Duration {
    let minutes = rng.gen_range(min_minutes..=max_minutes.max(min_minutes));
    Duration::from_secs(minutes.saturating_mul(60))
}
