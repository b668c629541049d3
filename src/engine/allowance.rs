//! Allowance manager.
//!
//! Makes sure the bridge contract may pull the transfer amount from the bot's
//! account, approving exactly that amount when the current allowance falls
//! short.

use alloy::primitives::{Address, TxHash, U256};
use anyhow::{Context, Result};
use tracing::info;

use crate::chain::ChainClient;
use crate::types::format_units;

/// What `ensure` had to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowanceAction {
    /// Existing allowance already covers the amount.
    Sufficient,
    /// An approval was mined.
    Approved(TxHash),
    /// Dry run: an approval would have been sent.
    WouldApprove,
}

#[derive(Debug, Clone)]
pub struct AllowanceManager {
    decimals: u8,
    dry_run: bool,
}

impl AllowanceManager {
    pub fn new(decimals: u8, dry_run: bool) -> Self {
        Self { decimals, dry_run }
    }

    /// Approve `spender` for `amount` of `token` unless the allowance already
    /// covers it. Blocks until the approval is confirmed.
    pub async fn ensure(
        &self,
        client: &dyn ChainClient,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<AllowanceAction> {
        let owner = client.address();
        let current = client
            .allowance(token, owner, spender)
            .await
            .context("Allowance check failed")?;

        if current >= amount {
            return Ok(AllowanceAction::Sufficient);
        }

        let human = format_units(amount, self.decimals);
        if self.dry_run {
            info!(%spender, amount = %human, "[DRY RUN] Would approve");
            return Ok(AllowanceAction::WouldApprove);
        }

        info!(%spender, amount = %human, "Approving token spend");
        let tx_hash = client
            .approve(token, spender, amount)
            .await
            .context("Approval failed")?;
        info!(%tx_hash, "Approval confirmed");
        Ok(AllowanceAction::Approved(tx_hash))
    }
}
