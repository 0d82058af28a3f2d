//! Token Market Data Port
//!
//! Abstracts the external market-data provider behind `TokenProvider` so the
//! aggregator and poller can run against live APIs or test doubles alike.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Token;

/// Longest response body kept in a status error
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Provider failure taxonomy
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Request could not be sent or timed out
    #[error("Network error: {0}")]
    Network(String),

    /// Provider answered with a non-success status
    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Token not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    /// Build a status error, clipping long bodies
    pub fn status(status: u16, body: &str) -> Self {
        let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        ProviderError::Status { status, body }
    }

    /// Request failed or the provider refused it
    pub fn is_network(&self) -> bool {
        matches!(self, ProviderError::Network(_) | ProviderError::Status { .. })
    }

    /// Worth another attempt: transport failures, rate limits and 5xx
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Network(_) => true,
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Network(format!("request timed out: {}", err))
        } else if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            ProviderError::status(status.as_u16(), &err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}

/// External source of normalized token records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Fetch every listed token, normalized and unranked.
    ///
    /// An empty result is `Ok(vec![])`, never an error.
    async fn fetch_tokens(&self) -> Result<Vec<Token>, ProviderError>;

    /// Look up a single token by mint address
    async fn fetch_token(&self, address: &str) -> Result<Token, ProviderError>;
}

#[async_trait]
impl<T: TokenProvider + ?Sized> TokenProvider for std::sync::Arc<T> {
    async fn fetch_tokens(&self) -> Result<Vec<Token>, ProviderError> {
        (**self).fetch_tokens().await
    }

    async fn fetch_token(&self, address: &str) -> Result<Token, ProviderError> {
        (**self).fetch_token(address).await
    }
}
