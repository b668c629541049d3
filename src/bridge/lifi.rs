//! LI.FI cross-chain aggregation API.
//!
//! API docs: https://docs.li.fi/li.fi-api/li.fi-api
//! Base URL: https://li.quest/v1
//! Auth: optional `x-lifi-api-key` header (raises rate limits).
//!
//! `GET /quote` returns the best route together with a ready-to-sign
//! `transactionRequest`. A 404 means no route exists for the pair/amount.

use alloy::primitives::{Address, Bytes, U256};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use super::BridgeAggregator;
use crate::types::{Quote, QuoteRequest};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const DEFAULT_API_URL: &str = "https://li.quest/v1";
const AGGREGATOR_NAME: &str = "lifi";

// ---------------------------------------------------------------------------
// API response types (LI.FI JSON → Rust)
// ---------------------------------------------------------------------------

/// The `/quote` response. Only the fields the bot uses are deserialized.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LifiQuote {
    #[serde(default)]
    tool: Option<String>,
    action: LifiAction,
    estimate: LifiEstimate,
    #[serde(default)]
    transaction_request: Option<LifiTransactionRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LifiAction {
    from_amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LifiEstimate {
    to_amount_min: String,
    #[serde(default)]
    to_amount: Option<String>,
    /// Seconds the bridge expects to take.
    #[serde(default)]
    execution_duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LifiTransactionRequest {
    to: String,
    data: String,
    /// Hex quantity, e.g. "0x0".
    #[serde(default)]
    value: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct LifiClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    integrator: Option<String>,
}

impl LifiClient {
    pub fn new(
        base_url: Option<String>,
        api_key: Option<String>,
        integrator: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("BACKSPENDER/0.1.0")
            .build()
            .context("Failed to build HTTP client for LI.FI")?;

        Ok(Self {
            http,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            integrator,
        })
    }

    fn query_params(&self, request: &QuoteRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("fromChain", request.from_chain.to_string()),
            ("toChain", request.to_chain.to_string()),
            ("fromToken", request.from_token.to_string()),
            ("toToken", request.to_token.to_string()),
            ("fromAddress", request.from_address.to_string()),
            ("toAddress", request.to_address.to_string()),
            ("fromAmount", request.from_amount.to_string()),
            ("slippage", request.slippage.normalize().to_string()),
        ];
        if let Some(integrator) = &self.integrator {
            params.push(("integrator", integrator.clone()));
        }
        params
    }

    /// Turn the raw response into a `Quote`, or `None` when LI.FI returned
    /// no transaction to submit.
    fn convert_quote(raw: LifiQuote) -> Result<Option<Quote>> {
        let Some(tx) = raw.transaction_request else {
            return Ok(None);
        };

        let value = match tx.value.as_deref() {
            Some(v) if !v.is_empty() => parse_quantity(v).context("Bad transactionRequest.value")?,
            _ => U256::ZERO,
        };

        Ok(Some(Quote {
            to: Address::from_str(&tx.to).context("Bad transactionRequest.to")?,
            data: Bytes::from_str(&tx.data).context("Bad transactionRequest.data")?,
            value,
            to_amount_min: parse_quantity(&raw.estimate.to_amount_min)
                .context("Bad estimate.toAmountMin")?,
            from_amount: parse_quantity(&raw.action.from_amount)
                .context("Bad action.fromAmount")?,
            tool: raw.tool,
        }))
    }
}

/// Parse a decimal or `0x`-prefixed hex integer.
fn parse_quantity(s: &str) -> Result<U256> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => U256::from_str_radix(hex, 16),
        None => U256::from_str_radix(s, 10),
    };
    parsed.with_context(|| format!("not an integer quantity: {s:?}"))
}

// ---------------------------------------------------------------------------
// BridgeAggregator trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl BridgeAggregator for LifiClient {
    async fn quote(&self, request: &QuoteRequest) -> Result<Option<Quote>> {
        let url = format!("{}/quote", self.base_url);
        debug!(
            from_chain = request.from_chain,
            to_chain = request.to_chain,
            amount = %request.from_amount,
            "Requesting LI.FI quote"
        );

        let mut req = self.http.get(&url).query(&self.query_params(request));
        if let Some(key) = &self.api_key {
            req = req.header("x-lifi-api-key", key);
        }

        let resp = req.send().await.context("LI.FI quote request failed")?;

        if resp.status() == StatusCode::NOT_FOUND {
            let body = resp.text().await.unwrap_or_default();
            debug!(body = %body, "LI.FI found no route");
            return Ok(None);
        }
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("LI.FI API error {status}: {body}");
        }

        let raw: LifiQuote = resp
            .json()
            .await
            .context("Failed to parse LI.FI quote response")?;

        info!(
            tool = raw.tool.as_deref().unwrap_or("unknown"),
            to_amount = raw.estimate.to_amount.as_deref().unwrap_or("?"),
            to_amount_min = %raw.estimate.to_amount_min,
            eta_secs = raw.estimate.execution_duration.unwrap_or_default(),
            "LI.FI quote received"
        );

        Self::convert_quote(raw)
    }

    fn name(&self) -> &str {
        AGGREGATOR_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
