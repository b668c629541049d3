//! Availability filter.
//!
//! Reads the bot's token balance on every registered network and keeps the
//! ones holding at least the minimum transfer amount.

use alloy::primitives::{Address, U256};
use anyhow::Result;
use tracing::debug;

use crate::chain::registry::ChainRegistry;
use crate::types::FundedNetwork;

/// Networks whose balance is at least `min_units`, in registry order.
///
/// A failed balance read aborts the whole scan; the caller treats it as a
/// failed attempt.
pub async fn funded_networks(
    registry: &ChainRegistry,
    owner: Address,
    min_units: U256,
) -> Result<Vec<FundedNetwork>> {
    let mut funded = Vec::new();

    for entry in registry.iter() {
        let balance = entry
            .client
            .token_balance(entry.network.token_address, owner)
            .await?;

        debug!(
            network = %entry.network.name,
            %balance,
            eligible = balance >= min_units,
            "Balance checked"
        );

        if balance >= min_units {
            funded.push(FundedNetwork {
                network: entry.network.clone(),
                balance,
            });
        }
    }

    Ok(funded)
}
