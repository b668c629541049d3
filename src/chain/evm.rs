//! alloy-backed `ChainClient`.
//!
//! One client per network. All clients share the same signer, so the same
//! account moves funds everywhere; the wallet filler takes care of nonce,
//! gas and chain id.

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use super::ChainClient;
use crate::types::Network;

sol! {
    #[sol(rpc)]
    contract ERC20 {
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

/// Parse the bot's private key.
pub fn load_signer(key: &SecretString) -> Result<PrivateKeySigner> {
    key.expose_secret()
        .trim()
        .parse::<PrivateKeySigner>()
        .context("Invalid private key")
}

pub struct EvmClient {
    network: String,
    provider: DynProvider,
    address: Address,
}

impl EvmClient {
    /// Build a signing HTTP provider for `network`.
    pub fn connect(network: &Network, signer: PrivateKeySigner) -> Result<Self> {
        let url = Url::parse(&network.rpc_url)
            .with_context(|| format!("Invalid RPC URL for {}", network.name))?;
        let address = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        Ok(Self {
            network: network.name.clone(),
            provider,
            address,
        })
    }

    fn ensure_success(&self, receipt: &TransactionReceipt, what: &str) -> Result<TxHash> {
        if !receipt.status() {
            anyhow::bail!(
                "{what} transaction {} reverted on {}",
                receipt.transaction_hash,
                self.network
            );
        }
        Ok(receipt.transaction_hash)
    }
}

#[async_trait]
impl ChainClient for EvmClient {
    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        let erc20 = ERC20::new(token, self.provider.clone());
        let balance = erc20
            .balanceOf(owner)
            .call()
            .await
            .with_context(|| format!("balanceOf failed on {}", self.network))?;
        debug!(network = %self.network, %token, %balance, "Token balance");
        Ok(balance)
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        let erc20 = ERC20::new(token, self.provider.clone());
        erc20
            .allowance(owner, spender)
            .call()
            .await
            .with_context(|| format!("allowance failed on {}", self.network))
    }

    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<TxHash> {
        let erc20 = ERC20::new(token, self.provider.clone());
        let receipt = erc20
            .approve(spender, amount)
            .send()
            .await
            .with_context(|| format!("approve submission failed on {}", self.network))?
            .get_receipt()
            .await
            .with_context(|| format!("approve confirmation failed on {}", self.network))?;
        self.ensure_success(&receipt, "approve")
    }

    async fn code_at(&self, address: Address) -> Result<Bytes> {
        self.provider
            .get_code_at(address)
            .await
            .with_context(|| format!("eth_getCode failed on {}", self.network))
    }

    async fn send_transaction(&self, to: Address, data: Bytes, value: U256) -> Result<TxHash> {
        let tx = TransactionRequest::default()
            .with_from(self.address)
            .with_to(to)
            .with_input(data)
            .with_value(value);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .with_context(|| format!("transaction submission failed on {}", self.network))?;
        debug!(network = %self.network, tx_hash = %pending.tx_hash(), "Transaction submitted");

        let receipt = pending
            .get_receipt()
            .await
            .with_context(|| format!("transaction confirmation failed on {}", self.network))?;
        self.ensure_success(&receipt, "bridge")
    }

    fn address(&self) -> Address {
        self.address
    }
}
