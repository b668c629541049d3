//! Chain registry: the configured networks, in order, each with its client.

use anyhow::Result;
use std::sync::Arc;

use alloy::signers::local::PrivateKeySigner;

use super::evm::EvmClient;
use super::ChainClient;
use crate::types::Network;

/// A network paired with the client used to read and write on it.
#[derive(Clone)]
pub struct ConnectedNetwork {
    pub network: Network,
    pub client: Arc<dyn ChainClient>,
}

#[derive(Clone, Default)]
pub struct ChainRegistry {
    entries: Vec<ConnectedNetwork>,
}

impl ChainRegistry {
    pub fn new(entries: Vec<ConnectedNetwork>) -> Self {
        Self { entries }
    }

    /// Connect every network with the same signer.
    pub fn connect(networks: Vec<Network>, signer: &PrivateKeySigner) -> Result<Self> {
        let entries = networks
            .into_iter()
            .map(|network| {
                let client = EvmClient::connect(&network, signer.clone())?;
                Ok(ConnectedNetwork {
                    network,
                    client: Arc::new(client) as Arc<dyn ChainClient>,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnectedNetwork> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, chain_id: u64) -> Option<&ConnectedNetwork> {
        self.entries.iter().find(|e| e.network.chain_id == chain_id)
    }

    /// Every network except `chain_id`, in registry order.
    pub fn others(&self, chain_id: u64) -> Vec<&ConnectedNetwork> {
        self.entries
            .iter()
            .filter(|e| e.network.chain_id != chain_id)
            .collect()
    }
}
