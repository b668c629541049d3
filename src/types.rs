//! Shared types for the BACKSPENDER bot.
//!
//! Everything here is ephemeral: networks are fixed at startup, and funded
//! networks, quotes, attempts and rounds live for a single attempt or round
//! and are only ever logged.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use chrono::{DateTime, Utc};
use std::fmt;

// ---------------------------------------------------------------------------
// Networks
// ---------------------------------------------------------------------------

/// A supported chain with the stablecoin contract we move on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub token_address: Address,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.chain_id)
    }
}

/// A network together with the balance observed during this selection cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundedNetwork {
    pub network: Network,
    /// Token balance in the smallest unit.
    pub balance: U256,
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

/// Parameters sent to the bridge aggregator for one route.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    pub from_chain: u64,
    pub to_chain: u64,
    pub from_token: Address,
    pub to_token: Address,
    pub from_address: Address,
    pub to_address: Address,
    pub from_amount: U256,
    /// Fractional slippage tolerance, e.g. 0.005 for 0.5%.
    pub slippage: rust_decimal::Decimal,
}

/// A route returned by the aggregator, ready to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    /// Bridge contract the transaction targets (also the token spender).
    pub to: Address,
    pub data: Bytes,
    /// Native value to attach.
    pub value: U256,
    pub to_amount_min: U256,
    pub from_amount: U256,
    /// Bridge or DEX the aggregator picked, when reported.
    pub tool: Option<String>,
}

impl Quote {
    /// `to_amount_min * 100 / from_amount`, truncated. `None` for a zero
    /// source amount.
    pub fn min_received_pct(&self) -> Option<U256> {
        if self.from_amount.is_zero() {
            return None;
        }
        Some(self.to_amount_min.saturating_mul(U256::from(100u64)) / self.from_amount)
    }
}

// ---------------------------------------------------------------------------
// Attempts
// ---------------------------------------------------------------------------

/// Source, destination and amount chosen for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    pub source: FundedNetwork,
    pub destination: Network,
    pub amount: U256,
}

/// Why an attempt ended without a transfer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("no network holds the minimum transfer amount")]
    NoEligibleSource,

    #[error("receiver {receiver} has contract code on {network}")]
    ReceiverIsContract { receiver: Address, network: String },

    #[error("no bridge route available")]
    NoRoute,

    #[error("minimum received is {pct}% of the sent amount (floor {floor}%)")]
    LowMinReceived { pct: U256, floor: u64 },

    #[error("attempt failed: {0}")]
    Failed(String),
}

/// Tagged result of a single attempt, the only thing the round loop sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Transferred { tx_hash: TxHash },
    Skipped(SkipReason),
}

impl AttemptOutcome {
    pub fn is_transfer(&self) -> bool {
        matches!(self, AttemptOutcome::Transferred { .. })
    }
}

/// Outcome of an attempt plus the plan it ran, if it got that far.
#[derive(Debug, Clone)]
pub struct AttemptReport {
    pub plan: Option<TransferPlan>,
    pub outcome: AttemptOutcome,
}

impl AttemptReport {
    pub fn skipped(plan: Option<TransferPlan>, reason: SkipReason) -> Self {
        Self {
            plan,
            outcome: AttemptOutcome::Skipped(reason),
        }
    }
}

/// Log record for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferAttempt {
    pub number: u32,
    pub source: String,
    pub destination: String,
    pub amount: U256,
    pub succeeded: bool,
}

impl TransferAttempt {
    /// Build the log record; `None` when the attempt never chose a route.
    pub fn from_report(number: u32, report: &AttemptReport) -> Option<Self> {
        let plan = report.plan.as_ref()?;
        Some(Self {
            number,
            source: plan.source.network.name.clone(),
            destination: plan.destination.name.clone(),
            amount: plan.amount,
            succeeded: report.outcome.is_transfer(),
        })
    }
}

// ---------------------------------------------------------------------------
// Rounds
// ---------------------------------------------------------------------------

/// In-memory progress of the current round.
#[derive(Debug, Clone)]
pub struct Round {
    pub number: u64,
    pub successful: u32,
    pub attempts: u32,
    pub started_at: DateTime<Utc>,
}

impl Round {
    pub fn start(number: u64) -> Self {
        Self {
            number,
            successful: 0,
            attempts: 0,
            started_at: Utc::now(),
        }
    }

    pub fn summary(&self, finished_at: DateTime<Utc>) -> RoundSummary {
        let elapsed = finished_at - self.started_at;
        RoundSummary {
            number: self.number,
            transfers: self.successful,
            attempts: self.attempts,
            elapsed_minutes: (elapsed.num_seconds() as f64 / 60.0).round() as i64,
        }
    }
}

/// Logged when a round completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSummary {
    pub number: u64,
    pub transfers: u32,
    pub attempts: u32,
    pub elapsed_minutes: i64,
}

impl fmt::Display for RoundSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Round {} | {} transfers in {} attempts | {} min",
            self.number, self.transfers, self.attempts, self.elapsed_minutes,
        )
    }
}

// ---------------------------------------------------------------------------
// Amount formatting
// ---------------------------------------------------------------------------

/// Render a raw token amount in human units, e.g. `12345678` with 6
/// decimals as `"12.345678"`.
pub fn format_units(amount: U256, decimals: u8) -> String {
    let scale = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / scale;
    if decimals == 0 {
        return whole.to_string();
    }
    let frac = (amount % scale).to_string();
    format!("{whole}.{frac:0>width$}", width = decimals as usize)
}

/// Convert whole cents into the token's smallest unit. Requires
/// `decimals >= 2`.
pub fn cents_to_units(cents: u64, decimals: u8) -> U256 {
    U256::from(cents) * U256::from(10u64).pow(U256::from(decimals.saturating_sub(2)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
