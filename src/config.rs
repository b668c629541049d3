//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` when present, otherwise falls back to the built-in
//! defaults (Optimism, Base and Soneium USDC). Secrets and RPC endpoints are
//! referenced by env-var name in the config and resolved at startup.

use alloy::primitives::Address;
use anyhow::{Context, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::types::{cents_to_units, Network};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default = "default_chains")]
    pub chains: Vec<ChainConfig>,
}

/// Transfer sizing and pacing.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BotConfig {
    pub min_usd: Decimal,
    pub max_usd: Decimal,
    pub token_decimals: u8,
    /// Display symbol for log lines.
    pub token_symbol: String,
    pub transfers_per_round: u32,
    pub min_delay_minutes: u64,
    pub max_delay_minutes: u64,
    pub cooldown_minutes: u64,
    pub skip_delay_secs: u64,
    /// Quote and log transfers without signing anything.
    pub dry_run: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            min_usd: dec!(10),
            max_usd: dec!(25),
            token_decimals: 6,
            token_symbol: "USDC".to_string(),
            transfers_per_round: 10,
            min_delay_minutes: 4,
            max_delay_minutes: 8,
            cooldown_minutes: 7,
            skip_delay_secs: 5,
            dry_run: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BridgeConfig {
    pub api_url: String,
    /// Env var holding an optional LI.FI API key.
    pub api_key_env: Option<String>,
    pub integrator: Option<String>,
    pub slippage: Decimal,
    /// Quotes whose minimum received falls below this percentage are dropped.
    pub min_received_pct: u64,
    pub request_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            api_url: "https://li.quest/v1".to_string(),
            api_key_env: Some("LIFI_API_KEY".to_string()),
            integrator: None,
            slippage: dec!(0.005),
            min_received_pct: 95,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WalletConfig {
    pub private_key_env: String,
    pub receiver_env: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key_env: "PRIVATE_KEY".to_string(),
            receiver_env: "RECEIVER_ADDRESS".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChainConfig {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url_env: String,
    pub token_address: String,
}

fn default_chains() -> Vec<ChainConfig> {
    [
        ("Optimism", 10, "RPC_URL_OP", "0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85"),
        ("Base", 8453, "RPC_URL_BASE", "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
        ("Soneium", 1868, "RPC_URL_SONEIUM", "0xbA9986D2381edf1DA03B0B9c1f8b00dc4AacC369"),
    ]
    .into_iter()
    .map(|(name, chain_id, rpc_url_env, token_address)| ChainConfig {
        name: name.to_string(),
        chain_id,
        rpc_url_env: rpc_url_env.to_string(),
        token_address: token_address.to_string(),
    })
    .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bot: BotConfig::default(),
            bridge: BridgeConfig::default(),
            wallet: WalletConfig::default(),
            chains: default_chains(),
        }
    }
}

/// Configuration problems detected before the bot starts.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("at least two chains are required, found {0}")]
    TooFewChains(usize),

    #[error("duplicate chain id {0}")]
    DuplicateChain(u64),

    #[error("invalid USD band: min {min} max {max}")]
    InvalidUsdBand { min: Decimal, max: Decimal },

    #[error("USD amount {0} is not a whole number of cents")]
    SubCentAmount(Decimal),

    #[error("invalid delay band: min {min} max {max} minutes")]
    InvalidDelayBand { min: u64, max: u64 },

    #[error("token decimals must be at least 2, got {0}")]
    TokenDecimals(u8),

    #[error("transfers_per_round must be at least 1")]
    EmptyRound,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load `path` if it exists, otherwise use the built-in defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            let cfg = Self::default();
            cfg.validate()?;
            Ok(cfg)
        }
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chains.len() < 2 {
            return Err(ConfigError::TooFewChains(self.chains.len()));
        }
        let mut seen = HashSet::new();
        for chain in &self.chains {
            if !seen.insert(chain.chain_id) {
                return Err(ConfigError::DuplicateChain(chain.chain_id));
            }
        }
        let bot = &self.bot;
        if bot.min_usd <= Decimal::ZERO || bot.min_usd > bot.max_usd {
            return Err(ConfigError::InvalidUsdBand { min: bot.min_usd, max: bot.max_usd });
        }
        for usd in [bot.min_usd, bot.max_usd] {
            if !(usd * dec!(100)).fract().is_zero() {
                return Err(ConfigError::SubCentAmount(usd));
            }
        }
        if bot.min_delay_minutes > bot.max_delay_minutes {
            return Err(ConfigError::InvalidDelayBand {
                min: bot.min_delay_minutes,
                max: bot.max_delay_minutes,
            });
        }
        if bot.token_decimals < 2 {
            return Err(ConfigError::TokenDecimals(bot.token_decimals));
        }
        if bot.transfers_per_round == 0 {
            return Err(ConfigError::EmptyRound);
        }
        Ok(())
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Resolve every chain's RPC endpoint and token address.
    pub fn networks(&self) -> Result<Vec<Network>> {
        self.chains
            .iter()
            .map(|chain| {
                let rpc_url = Self::resolve_env(&chain.rpc_url_env)
                    .with_context(|| format!("No RPC endpoint for {}", chain.name))?;
                let token_address = Address::from_str(&chain.token_address)
                    .with_context(|| format!("Bad token address for {}", chain.name))?;
                Ok(Network {
                    name: chain.name.clone(),
                    chain_id: chain.chain_id,
                    rpc_url,
                    token_address,
                })
            })
            .collect()
    }

    pub fn private_key(&self) -> Result<SecretString> {
        Self::resolve_env(&self.wallet.private_key_env).map(SecretString::new)
    }

    pub fn receiver(&self) -> Result<Address> {
        let raw = Self::resolve_env(&self.wallet.receiver_env)?;
        Address::from_str(raw.trim())
            .with_context(|| format!("Invalid receiver address in {}", self.wallet.receiver_env))
    }

    pub fn bridge_api_key(&self) -> Option<String> {
        self.bridge
            .api_key_env
            .as_deref()
            .and_then(|env| std::env::var(env).ok())
            .filter(|key| !key.is_empty())
    }
}

impl BotConfig {
    /// USD band in whole cents.
    pub fn cents_band(&self) -> (u64, u64) {
        let to_cents = |usd: Decimal| (usd * dec!(100)).trunc().to_u64().unwrap_or(0);
        (to_cents(self.min_usd), to_cents(self.max_usd))
    }

    /// Minimum transfer amount in the token's smallest unit.
    pub fn min_units(&self) -> alloy::primitives::U256 {
        cents_to_units(self.cents_band().0, self.token_decimals)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_minutes.saturating_mul(60))
    }

    pub fn skip_delay(&self) -> Duration {
        Duration::from_secs(self.skip_delay_secs)
    }
}
