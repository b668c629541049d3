//! BACKSPENDER: randomized cross-chain stablecoin rebalancing bot
//!
//! Entry point. Loads configuration and secrets, initialises structured
//! logging, connects to every network, and runs the round loop until
//! Ctrl+C.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use backspender::bridge::lifi::LifiClient;
use backspender::bridge::RouteQuoter;
use backspender::chain::evm::load_signer;
use backspender::chain::registry::ChainRegistry;
use backspender::config::AppConfig;
use backspender::engine::amount::AmountSelector;
use backspender::engine::attempt::TransferPipeline;
use backspender::engine::rounds::{RoundLoop, RoundSettings};
use backspender::types::format_units;

const BANNER: &str = r#"
  ___   _   ___ _  _____ ___ ___ _  _ ___  ___ ___
 | _ ) /_\ / __| |/ / __| _ \ __| \| |   \| __| _ \
 | _ \/ _ \ (__| ' <\__ \  _/ _|| .` | |) | _||   /
 |___/_/ \_\___|_|\_\___/_| |___|_|\_|___/|___|_|_\

  Randomized cross-chain USDC rebalancer
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load_or_default("config.toml")?;

    init_logging();

    println!("{BANNER}");

    // -- Secrets and networks --------------------------------------------

    let signer = load_signer(&cfg.private_key()?)?;
    let receiver = cfg.receiver()?;
    let networks = cfg.networks()?;
    let sender = signer.address();

    let amounts = AmountSelector::from_config(&cfg.bot);
    info!(
        %sender,
        %receiver,
        chains = ?networks.iter().map(|n| n.name.as_str()).collect::<Vec<_>>(),
        min = %format_units(amounts.min_units(), cfg.bot.token_decimals),
        max_usd = %cfg.bot.max_usd,
        per_round = cfg.bot.transfers_per_round,
        dry_run = cfg.bot.dry_run,
        "BACKSPENDER starting up"
    );
    if cfg.bot.dry_run {
        warn!("Dry-run mode: no approvals or bridge transactions will be signed");
    }

    // -- Initialise components -------------------------------------------

    let registry = ChainRegistry::connect(networks, &signer)?;

    let aggregator = LifiClient::new(
        Some(cfg.bridge.api_url.clone()),
        cfg.bridge_api_key(),
        cfg.bridge.integrator.clone(),
        Duration::from_secs(cfg.bridge.request_timeout_secs),
    )?;
    let quoter = RouteQuoter::new(Arc::new(aggregator), cfg.bridge.min_received_pct);

    let pipeline = TransferPipeline::new(
        registry,
        quoter,
        amounts,
        sender,
        receiver,
        cfg.bridge.slippage,
        cfg.bot.token_symbol.clone(),
        cfg.bot.dry_run,
    );

    let mut rounds = RoundLoop::new(
        pipeline,
        RoundSettings::from_config(&cfg.bot),
        StdRng::from_entropy(),
    );

    // -- Main loop -------------------------------------------------------

    info!("Entering round loop. Press Ctrl+C to stop.");

    tokio::select! {
        _ = rounds.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!(
                round = rounds.round().number,
                transfers = rounds.round().successful,
                "Shutdown signal received."
            );
        }
    }

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("backspender=info"));

    let json_logging = std::env::var("BACKSPENDER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
