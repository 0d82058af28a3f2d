//! Configuration Loader
//!
//! Loads and validates configuration from a TOML file layered with
//! `NASDANQ__SECTION__KEY` environment overrides. Every field has a default,
//! so a missing section (or a missing file via `load_config_or_default`)
//! still yields a working configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adapters::dexscreener::{DexScreenerConfig, DEXSCREENER_BASE_URL, WRAPPED_SOL_MINT};
use crate::application::aggregator::{
    AggregatorConfig, RetryPolicy, ViabilityThresholds, DEFAULT_LIMIT,
    DEFAULT_MIN_MARKET_CAP_USD, DEFAULT_MIN_VOLUME_24H_USD,
};
use crate::application::poller::{PollerConfig, DEFAULT_POLL_INTERVAL};
use crate::domain::Period;

/// Config file used when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "config/leaderboard.toml";

/// Environment variable prefix (`NASDANQ__POLLING__INTERVAL_SECS=10`)
pub const ENV_PREFIX: &str = "NASDANQ";
const ENV_SEPARATOR: &str = "__";

/// Main configuration structure matching leaderboard.toml
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderSection,
    pub leaderboard: LeaderboardSection,
    pub polling: PollingSection,
    pub logging: LoggingSection,
}

/// Market-data provider section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    /// DexScreener API root
    pub base_url: String,
    /// Mint whose pairs form the leaderboard universe
    pub base_asset: String,
    /// Chain filter (empty = any)
    pub chain_id: String,
    /// DEX filter (empty = any)
    pub dex_ids: Vec<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ProviderSection {
    fn default() -> Self {
        let dex = DexScreenerConfig::default();
        Self {
            base_url: DEXSCREENER_BASE_URL.to_string(),
            base_asset: WRAPPED_SOL_MINT.to_string(),
            chain_id: dex.chain_id,
            dex_ids: dex.dex_ids,
            timeout_secs: dex.timeout.as_secs(),
        }
    }
}

/// Ranking section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardSection {
    /// Period shown on startup ("recent" or "volume")
    pub default_period: Period,
    /// Rows per leaderboard
    pub default_limit: usize,
    /// Viability floor for market cap (USD)
    pub min_market_cap_usd: f64,
    /// Viability floor for 24h volume (USD)
    pub min_volume_24h_usd: f64,
    /// Provider attempts per call, first try included
    pub max_attempts: u32,
    /// Linear retry backoff unit in milliseconds
    pub retry_backoff_ms: u64,
}

impl Default for LeaderboardSection {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            default_period: Period::default(),
            default_limit: DEFAULT_LIMIT,
            min_market_cap_usd: DEFAULT_MIN_MARKET_CAP_USD,
            min_volume_24h_usd: DEFAULT_MIN_VOLUME_24H_USD,
            max_attempts: retry.max_attempts,
            retry_backoff_ms: retry.backoff.as_millis() as u64,
        }
    }
}

/// Auto-refresh section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSection {
    pub interval_secs: u64,
}

impl Default for PollingSection {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to load config: {0}")]
    LoadError(#[from] ::config::ConfigError),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file; the file must exist
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    load_layered(Some(path), None)
}

/// Load configuration from `path` if it exists, otherwise defaults plus
/// environment overrides
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    if path.is_file() {
        load_layered(Some(path), None)
    } else {
        tracing::debug!("No config at {}, using defaults", path.display());
        load_layered(None, None)
    }
}

/// Layer file and environment sources. `env` replaces the process
/// environment when given.
fn load_layered(
    path: Option<&Path>,
    env: Option<::config::Map<String, String>>,
) -> Result<Config, ConfigError> {
    let mut builder = ::config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(
            ::config::File::from(path)
                .format(::config::FileFormat::Toml)
                .required(true),
        );
    }

    let environment = ::config::Environment::with_prefix(ENV_PREFIX)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("provider.dex_ids")
        .source(env);

    let config: Config = builder
        .add_source(environment)
        .build()?
        .try_deserialize()?;

    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.provider.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.base_url cannot be empty".to_string(),
            ));
        }

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "provider.base_url must be an http(s) URL, got '{}'",
                base_url
            )));
        }

        if self.provider.base_asset.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.base_asset cannot be empty".to_string(),
            ));
        }

        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "provider.timeout_secs must be > 0".to_string(),
            ));
        }

        if self.leaderboard.default_limit == 0 {
            return Err(ConfigError::ValidationError(
                "leaderboard.default_limit must be > 0".to_string(),
            ));
        }

        if !is_non_negative(self.leaderboard.min_market_cap_usd) {
            return Err(ConfigError::ValidationError(format!(
                "leaderboard.min_market_cap_usd must be >= 0, got {}",
                self.leaderboard.min_market_cap_usd
            )));
        }

        if !is_non_negative(self.leaderboard.min_volume_24h_usd) {
            return Err(ConfigError::ValidationError(format!(
                "leaderboard.min_volume_24h_usd must be >= 0, got {}",
                self.leaderboard.min_volume_24h_usd
            )));
        }

        if self.leaderboard.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "leaderboard.max_attempts must be > 0".to_string(),
            ));
        }

        if self.polling.interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "polling.interval_secs must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

impl From<&Config> for DexScreenerConfig {
    fn from(config: &Config) -> Self {
        DexScreenerConfig {
            base_url: config.provider.base_url.trim().to_string(),
            base_asset: config.provider.base_asset.trim().to_string(),
            chain_id: config.provider.chain_id.clone(),
            dex_ids: config.provider.dex_ids.clone(),
            timeout: Duration::from_secs(config.provider.timeout_secs),
        }
    }
}

impl From<&Config> for AggregatorConfig {
    fn from(config: &Config) -> Self {
        AggregatorConfig {
            thresholds: ViabilityThresholds {
                min_market_cap_usd: config.leaderboard.min_market_cap_usd,
                min_volume_24h_usd: config.leaderboard.min_volume_24h_usd,
            },
            retry: RetryPolicy {
                max_attempts: config.leaderboard.max_attempts,
                backoff: Duration::from_millis(config.leaderboard.retry_backoff_ms),
            },
            default_limit: config.leaderboard.default_limit,
        }
    }
}

impl From<&Config> for PollerConfig {
    fn from(config: &Config) -> Self {
        PollerConfig {
            interval: Duration::from_secs(config.polling.interval_secs),
            limit: config.leaderboard.default_limit,
            period: config.leaderboard.default_period,
        }
    }
}
