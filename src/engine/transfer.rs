//! Transfer executor.
//!
//! Submits the aggregator's transaction on the source network and waits for
//! it to be mined. In dry-run mode nothing is signed.

use alloy::primitives::TxHash;
use anyhow::{Context, Result};
use tracing::info;

use crate::chain::ChainClient;
use crate::types::Quote;

#[derive(Debug, Clone)]
pub struct TransferExecutor {
    dry_run: bool,
}

impl TransferExecutor {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Send `quote` and return the confirmed transaction hash. Dry runs
    /// return the zero hash.
    pub async fn execute(&self, client: &dyn ChainClient, quote: &Quote) -> Result<TxHash> {
        if self.dry_run {
            info!(
                to = %quote.to,
                value = %quote.value,
                calldata_bytes = quote.data.len(),
                "[DRY RUN] Would submit bridge transaction"
            );
            return Ok(TxHash::ZERO);
        }

        client
            .send_transaction(quote.to, quote.data.clone(), quote.value)
            .await
            .context("Bridge transaction failed")
    }
}
