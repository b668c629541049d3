//! Receiver guard: refuse to bridge to an address that is a contract on the
//! destination network.

use alloy::primitives::Address;
use anyhow::Result;

use crate::chain::ChainClient;

/// True when `receiver` has deployed bytecode on the client's network.
pub async fn receiver_is_contract(client: &dyn ChainClient, receiver: Address) -> Result<bool> {
    let code = client.code_at(receiver).await?;
    Ok(!code.is_empty())
}
