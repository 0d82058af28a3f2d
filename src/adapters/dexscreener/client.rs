//! DexScreener API Client
//!
//! HTTP client for the free DexScreener token-pairs API (300 req/min, no key).
//! Fetches every pair quoted against the configured base asset, keeps the
//! chain/dex combinations the leaderboard tracks, and normalizes them into
//! canonical tokens. No retries happen here; the aggregator owns that policy.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::domain::Token;
use crate::ports::market_data::{ProviderError, TokenProvider};
use super::normalize::convert_to_token;
use super::types::DexPair;

/// Default DexScreener API root
pub const DEXSCREENER_BASE_URL: &str = "https://api.dexscreener.com/latest";

/// Wrapped SOL mint; every pump.fun graduate trades against it
pub const WRAPPED_SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// DexScreener client configuration
#[derive(Debug, Clone)]
pub struct DexScreenerConfig {
    /// API root, e.g. `https://api.dexscreener.com/latest`
    pub base_url: String,
    /// Mint whose pairs make up the leaderboard universe
    pub base_asset: String,
    /// Only pairs on this chain are kept (empty = any chain)
    pub chain_id: String,
    /// Only pairs on these DEXes are kept (empty = any DEX)
    pub dex_ids: Vec<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for DexScreenerConfig {
    fn default() -> Self {
        Self {
            base_url: DEXSCREENER_BASE_URL.to_string(),
            base_asset: WRAPPED_SOL_MINT.to_string(),
            chain_id: "solana".to_string(),
            dex_ids: vec!["raydium".to_string(), "pumpfun".to_string()],
            timeout: Duration::from_secs(10),
        }
    }
}

impl DexScreenerConfig {
    pub fn validate(&self) -> Result<(), ProviderError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ProviderError::Config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.base_asset.trim().is_empty() {
            return Err(ProviderError::Config("base_asset cannot be empty".into()));
        }
        if self.timeout.is_zero() {
            return Err(ProviderError::Config("timeout must be > 0".into()));
        }
        Ok(())
    }
}

/// DexScreener market-data client
#[derive(Debug, Clone)]
pub struct DexScreenerClient {
    config: DexScreenerConfig,
    http: Client,
}

impl DexScreenerClient {
    /// Create a client with default configuration
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_config(DexScreenerConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: DexScreenerConfig) -> Result<Self, ProviderError> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("nasdanq/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &DexScreenerConfig {
        &self.config
    }

    /// Fetch the leaderboard universe: pairs against the base asset that
    /// pass the chain/dex source filter.
    pub async fn fetch_pairs(&self) -> Result<Vec<DexPair>, ProviderError> {
        let url = self.tokens_url(&self.config.base_asset);
        let pairs = self.get_pairs(&url).await?;
        let total = pairs.len();

        let accepted: Vec<DexPair> = pairs.into_iter().filter(|p| self.accepts(p)).collect();
        tracing::debug!(total, accepted = accepted.len(), "DexScreener pairs filtered");

        Ok(accepted)
    }

    /// Fetch every pair listing `address`, without the source filter
    pub async fn fetch_token_pairs(&self, address: &str) -> Result<Vec<DexPair>, ProviderError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(ProviderError::NotFound("empty address".into()));
        }
        self.get_pairs(&self.tokens_url(address)).await
    }

    fn tokens_url(&self, address: &str) -> String {
        format!(
            "{}/dex/tokens/{}",
            self.config.base_url.trim_end_matches('/'),
            address
        )
    }

    async fn get_pairs(&self, url: &str) -> Result<Vec<DexPair>, ProviderError> {
        tracing::debug!(url, "DexScreener request");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::status(status.as_u16(), &body));
        }

        parse_pairs(&body)
    }

    /// Source filter: tracked chain, tracked DEX, and not the base asset itself
    pub fn accepts(&self, pair: &DexPair) -> bool {
        let chain_ok = self.config.chain_id.is_empty()
            || pair
                .chain_id
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(&self.config.chain_id));

        let dex_ok = self.config.dex_ids.is_empty()
            || pair.dex_id.as_deref().is_some_and(|d| {
                self.config.dex_ids.iter().any(|id| id.eq_ignore_ascii_case(d))
            });

        let not_base = pair.base_address() != Some(self.config.base_asset.as_str());

        chain_ok && dex_ok && not_base
    }
}

/// Parse a `/dex/tokens` body.
///
/// Accepts `{"pairs": [...]}` or a bare array. Missing or `null` pairs mean
/// no data. Individual pairs that are not objects are skipped with a warning.
pub fn parse_pairs(body: &str) -> Result<Vec<DexPair>, ProviderError> {
    let value: Value = serde_json::from_str(body)?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("pairs") {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(ProviderError::Parse(format!(
                    "'pairs' should be an array, got {}",
                    json_kind(&other)
                )))
            }
        },
        other => {
            return Err(ProviderError::Parse(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };

    let pairs = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match DexPair::from_value(item) {
            Ok(pair) => Some(pair),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping malformed DexScreener pair");
                None
            }
        })
        .collect();

    Ok(pairs)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl TokenProvider for DexScreenerClient {
    async fn fetch_tokens(&self) -> Result<Vec<Token>, ProviderError> {
        let pairs = self.fetch_pairs().await?;
        Ok(pairs.iter().map(convert_to_token).collect())
    }

    /// First pair whose base token is `address`
    async fn fetch_token(&self, address: &str) -> Result<Token, ProviderError> {
        let pairs = self.fetch_token_pairs(address).await?;

        pairs
            .iter()
            .find(|p| p.base_address() == Some(address.trim()))
            .map(convert_to_token)
            .ok_or_else(|| ProviderError::NotFound(address.to_string()))
    }
}
