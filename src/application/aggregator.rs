//! Leaderboard Aggregator
//!
//! Turns raw provider output into ranked snapshots and market summaries:
//! viability filtering, period-dependent ordering, limiting and ranking.

use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::{MarketSummary, Period, Snapshot, Token};
use crate::ports::market_data::{ProviderError, TokenProvider};

/// Default minimum market cap (USD) to appear on the leaderboard
pub const DEFAULT_MIN_MARKET_CAP_USD: f64 = 1_000.0;
/// Default minimum 24h volume (USD) to appear on the leaderboard
pub const DEFAULT_MIN_VOLUME_24H_USD: f64 = 100.0;
/// Default number of ranked rows
pub const DEFAULT_LIMIT: usize = 50;

/// Minimum market cap / volume a token must clear
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViabilityThresholds {
    pub min_market_cap_usd: f64,
    pub min_volume_24h_usd: f64,
}

impl Default for ViabilityThresholds {
    fn default() -> Self {
        Self {
            min_market_cap_usd: DEFAULT_MIN_MARKET_CAP_USD,
            min_volume_24h_usd: DEFAULT_MIN_VOLUME_24H_USD,
        }
    }
}

impl ViabilityThresholds {
    /// Accept anything with a positive cap and volume
    pub fn permissive() -> Self {
        Self {
            min_market_cap_usd: 0.0,
            min_volume_24h_usd: 0.0,
        }
    }

    /// Zero cap or zero volume never passes, whatever the thresholds
    pub fn is_viable(&self, token: &Token) -> bool {
        token.market_cap > 0.0
            && token.volume_24h > 0.0
            && token.market_cap >= self.min_market_cap_usd
            && token.volume_24h >= self.min_volume_24h_usd
    }
}

/// Caller-side retry policy for provider calls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first (1 = no retry)
    pub max_attempts: u32,
    /// Linear backoff unit: attempt n waits `backoff * n`
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorConfig {
    pub thresholds: ViabilityThresholds,
    pub retry: RetryPolicy,
    pub default_limit: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            thresholds: ViabilityThresholds::default(),
            retry: RetryPolicy::default(),
            default_limit: DEFAULT_LIMIT,
        }
    }
}

/// Ranks and summarizes provider data
#[derive(Debug, Clone)]
pub struct Aggregator<P> {
    provider: P,
    config: AggregatorConfig,
}

impl<P: TokenProvider> Aggregator<P> {
    pub fn new(provider: P, config: AggregatorConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Ranked leaderboard for `period`, at most `limit` rows.
    ///
    /// An empty provider answer (or nothing viable) yields a `NoData`
    /// snapshot; provider failures propagate unchanged.
    pub async fn get_ranked(&self, period: Period, limit: usize) -> Result<Snapshot, ProviderError> {
        let tokens = self.fetch_with_retry().await?;
        let fetched_at = Utc::now();

        if tokens.is_empty() {
            tracing::info!(%period, "Provider returned no tokens");
            return Ok(Snapshot::empty(period, fetched_at));
        }

        let fetched = tokens.len();
        let mut viable = self.viable(tokens);
        let kept = viable.len();

        sort_for_period(&mut viable, period);
        viable.truncate(limit);

        tracing::debug!(%period, fetched, viable = kept, ranked = viable.len(), "Leaderboard ranked");
        Ok(Snapshot::ranked(period, viable, fetched_at))
    }

    /// Ranked leaderboard using the configured default limit
    pub async fn get_ranked_default(&self, period: Period) -> Result<Snapshot, ProviderError> {
        self.get_ranked(period, self.config.default_limit).await
    }

    /// Market summary over every viable token, from its own provider call
    pub async fn get_summary(&self) -> Result<MarketSummary, ProviderError> {
        let tokens = self.fetch_with_retry().await?;
        let viable = self.viable(tokens);
        let summary = MarketSummary::from_tokens(&viable, Utc::now());

        tracing::debug!(
            active = summary.active_tokens,
            volume = summary.total_volume_24h,
            "Market summary computed"
        );
        Ok(summary)
    }

    /// Single token details, unranked
    pub async fn get_token(&self, address: &str) -> Result<Token, ProviderError> {
        self.provider.fetch_token(address).await
    }

    /// Drop unaddressed tokens, duplicate addresses (first wins) and
    /// anything below the viability thresholds.
    fn viable(&self, tokens: Vec<Token>) -> Vec<Token> {
        let mut seen = HashSet::with_capacity(tokens.len());

        tokens
            .into_iter()
            .filter(|t| !t.address.is_empty())
            .filter(|t| seen.insert(t.address.clone()))
            .filter(|t| self.config.thresholds.is_viable(t))
            .collect()
    }

    async fn fetch_with_retry(&self) -> Result<Vec<Token>, ProviderError> {
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.provider.fetch_tokens().await {
                Ok(tokens) => return Ok(tokens),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let backoff = self.config.retry.backoff * attempt;
                    tracing::warn!(
                        "Provider call failed ({}), retrying in {:?} (attempt {}/{})",
                        e, backoff, attempt + 1, max_attempts
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Stable descending sort on the period's ranking key
pub fn sort_for_period(tokens: &mut [Token], period: Period) {
    match period {
        Period::Recent => tokens.sort_by(|a, b| b.market_cap.total_cmp(&a.market_cap)),
        Period::Volume => tokens.sort_by(|a, b| b.volume_24h.total_cmp(&a.volume_24h)),
    }
}
