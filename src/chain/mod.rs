//! Chain access.
//!
//! Defines the `ChainClient` trait (the RPC surface the bot needs on each
//! network) and the registry that pairs every configured network with its
//! client:
//! - `evm`: alloy-backed client signing with the bot's private key
//! - `registry`: ordered list of networks and their clients

pub mod evm;
pub mod registry;

use alloy::primitives::{Address, Bytes, TxHash, U256};
use anyhow::Result;
use async_trait::async_trait;

/// Abstraction over one network's JSON-RPC endpoint plus the signing account.
///
/// Write operations block until the transaction has a receipt and fail if it
/// reverted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// ERC-20 `balanceOf(owner)`.
    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256>;

    /// ERC-20 `allowance(owner, spender)`.
    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256>;

    /// Submit ERC-20 `approve(spender, amount)` and wait for it to be mined.
    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<TxHash>;

    /// Deployed bytecode at `address`; empty for plain accounts.
    async fn code_at(&self, address: Address) -> Result<Bytes>;

    /// Send a raw call and wait for it to be mined.
    async fn send_transaction(&self, to: Address, data: Bytes, value: U256) -> Result<TxHash>;

    /// The signing account on this network.
    fn address(&self) -> Address;
}
