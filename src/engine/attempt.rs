//! One transfer attempt: funded source → destination → amount → receiver
//! check → quote → allowance → bridge transaction.
//!
//! Every failure inside an attempt is folded into an `AttemptOutcome`; the
//! round loop never sees an error.

use alloy::primitives::Address;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::allowance::{AllowanceAction, AllowanceManager};
use super::amount::AmountSelector;
use super::availability::funded_networks;
use super::receiver::receiver_is_contract;
use super::transfer::TransferExecutor;
use crate::bridge::{RouteDecision, RouteQuoter};
use crate::chain::registry::ChainRegistry;
use crate::types::{
    format_units, AttemptOutcome, AttemptReport, FundedNetwork, QuoteRequest, SkipReason,
    TransferPlan,
};

/// Something that can run a single attempt. The round loop is generic over
/// this so it can be driven by scripted outcomes in tests.
#[async_trait]
pub trait AttemptRunner: Send + Sync {
    async fn run_attempt<R: Rng + Send>(&self, number: u32, rng: &mut R) -> AttemptReport;
}

/// The production attempt: real balances, real quotes, real transactions.
pub struct TransferPipeline {
    registry: ChainRegistry,
    quoter: RouteQuoter,
    allowances: AllowanceManager,
    executor: TransferExecutor,
    amounts: AmountSelector,
    sender: Address,
    receiver: Address,
    slippage: Decimal,
    symbol: String,
}

impl TransferPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: ChainRegistry,
        quoter: RouteQuoter,
        amounts: AmountSelector,
        sender: Address,
        receiver: Address,
        slippage: Decimal,
        symbol: String,
        dry_run: bool,
    ) -> Self {
        Self {
            registry,
            quoter,
            allowances: AllowanceManager::new(amounts.decimals(), dry_run),
            executor: TransferExecutor::new(dry_run),
            amounts,
            sender,
            receiver,
            slippage,
            symbol,
        }
    }

    fn human(&self, amount: alloy::primitives::U256) -> String {
        format!("{} {}", format_units(amount, self.amounts.decimals()), self.symbol)
    }

    /// Pick a funded source uniformly, then any other registered network
    /// uniformly, then an amount.
    pub fn plan<R: Rng>(
        &self,
        funded: &[FundedNetwork],
        rng: &mut R,
    ) -> Result<TransferPlan, SkipReason> {
        let source = funded.choose(rng).ok_or(SkipReason::NoEligibleSource)?;
        let destination = self
            .registry
            .others(source.network.chain_id)
            .choose(rng)
            .map(|entry| entry.network.clone())
            .ok_or(SkipReason::NoRoute)?;
        let amount = self.amounts.pick(source.balance, rng);

        Ok(TransferPlan {
            source: source.clone(),
            destination,
            amount,
        })
    }

    async fn execute_plan(&self, number: u32, plan: &TransferPlan) -> Result<AttemptOutcome> {
        let source = self
            .registry
            .get(plan.source.network.chain_id)
            .context("Source network missing from registry")?;
        let destination = self
            .registry
            .get(plan.destination.chain_id)
            .context("Destination network missing from registry")?;

        if receiver_is_contract(destination.client.as_ref(), self.receiver)
            .await
            .context("Receiver code check failed")?
        {
            warn!(
                receiver = %self.receiver,
                network = %plan.destination.name,
                "Receiver address is a contract. Skipping."
            );
            return Ok(AttemptOutcome::Skipped(SkipReason::ReceiverIsContract {
                receiver: self.receiver,
                network: plan.destination.name.clone(),
            }));
        }

        let request = QuoteRequest {
            from_chain: plan.source.network.chain_id,
            to_chain: plan.destination.chain_id,
            from_token: plan.source.network.token_address,
            to_token: plan.destination.token_address,
            from_address: self.sender,
            to_address: self.receiver,
            from_amount: plan.amount,
            slippage: self.slippage,
        };

        let quote = match self.quoter.route(&request).await.context("Quote request failed")? {
            RouteDecision::Accepted(quote) => quote,
            RouteDecision::Rejected(reason) => return Ok(AttemptOutcome::Skipped(reason)),
        };

        let action = self
            .allowances
            .ensure(
                source.client.as_ref(),
                plan.source.network.token_address,
                quote.to,
                plan.amount,
            )
            .await?;
        if let AllowanceAction::Approved(tx_hash) = action {
            info!(%tx_hash, spender = %quote.to, "Allowance raised");
        }

        let tx_hash = self.executor.execute(source.client.as_ref(), &quote).await?;

        info!(
            tx = number,
            amount = %self.human(plan.amount),
            from = %plan.source.network.name,
            to = %plan.destination.name,
            %tx_hash,
            dry_run = self.executor.is_dry_run(),
            "Transfer confirmed"
        );

        Ok(AttemptOutcome::Transferred { tx_hash })
    }
}

#[async_trait]
impl AttemptRunner for TransferPipeline {
    async fn run_attempt<R: Rng + Send>(&self, number: u32, rng: &mut R) -> AttemptReport {
        let funded =
            match funded_networks(&self.registry, self.sender, self.amounts.min_units()).await {
                Ok(funded) => funded,
                Err(e) => {
                    warn!(tx = number, error = %format!("{e:#}"), "Balance scan failed");
                    return AttemptReport::skipped(None, SkipReason::Failed(format!("{e:#}")));
                }
            };

        let plan = match self.plan(&funded, rng) {
            Ok(plan) => plan,
            Err(reason) => return AttemptReport::skipped(None, reason),
        };

        info!(
            tx = number,
            from = %plan.source.network.name,
            to = %plan.destination.name,
            amount = %self.human(plan.amount),
            balance = %self.human(plan.source.balance),
            "Preparing transfer"
        );

        let outcome = match self.execute_plan(number, &plan).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(tx = number, error = %format!("{e:#}"), "Transfer failed");
                AttemptOutcome::Skipped(SkipReason::Failed(format!("{e:#}")))
            }
        };

        AttemptReport {
            plan: Some(plan),
            outcome,
        }
    }
}
