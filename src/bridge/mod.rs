//! Bridge routing.
//!
//! Defines the `BridgeAggregator` trait and the `RouteQuoter` that applies
//! the bot's quote policy on top of it:
//! - `lifi`: LI.FI aggregation API client

pub mod lifi;

use alloy::primitives::U256;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::types::{Quote, QuoteRequest, SkipReason};

/// Abstraction over cross-chain route aggregators.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BridgeAggregator: Send + Sync {
    /// Ask for a route. `Ok(None)` means the service found nothing to
    /// submit; transport and decode failures are errors.
    async fn quote(&self, request: &QuoteRequest) -> Result<Option<Quote>>;

    /// Aggregator name for logging.
    fn name(&self) -> &str;
}

/// Result of asking for a route and checking it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Accepted(Quote),
    Rejected(SkipReason),
}

/// Requests routes and rejects quotes that lose too much in transit.
#[derive(Clone)]
pub struct RouteQuoter {
    aggregator: Arc<dyn BridgeAggregator>,
    min_received_pct: u64,
}

impl RouteQuoter {
    pub fn new(aggregator: Arc<dyn BridgeAggregator>, min_received_pct: u64) -> Self {
        Self {
            aggregator,
            min_received_pct,
        }
    }

    pub async fn route(&self, request: &QuoteRequest) -> Result<RouteDecision> {
        let Some(quote) = self.aggregator.quote(request).await? else {
            warn!(
                aggregator = self.aggregator.name(),
                from_chain = request.from_chain,
                to_chain = request.to_chain,
                "No valid bridge route"
            );
            return Ok(RouteDecision::Rejected(SkipReason::NoRoute));
        };

        if let Err(reason) = self.check(&quote) {
            warn!(
                from_amount = %quote.from_amount,
                to_amount_min = %quote.to_amount_min,
                %reason,
                "Quote rejected"
            );
            return Ok(RouteDecision::Rejected(reason));
        }

        debug!(
            tool = quote.tool.as_deref().unwrap_or("unknown"),
            to = %quote.to,
            "Quote accepted"
        );
        Ok(RouteDecision::Accepted(quote))
    }

    /// Minimum-received floor: `to_amount_min * 100 / from_amount` must be
    /// at least the configured percentage. A zero source amount never passes.
    pub fn check(&self, quote: &Quote) -> Result<(), SkipReason> {
        let floor = self.min_received_pct;
        match quote.min_received_pct() {
            Some(pct) if pct >= U256::from(floor) => Ok(()),
            Some(pct) => Err(SkipReason::LowMinReceived { pct, floor }),
            None => Err(SkipReason::LowMinReceived { pct: U256::ZERO, floor }),
        }
    }
}
