use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;

use crate::domain::Token;
use super::market_data::{ProviderError, TokenProvider};

/// One queued provider answer
#[derive(Debug, Clone)]
struct ScriptedResponse {
    result: Result<Vec<Token>, ProviderError>,
    delay: Duration,
}

/// Scripted token provider that records calls and replays queued responses.
///
/// Every `fetch_tokens` call pops the next queued response; once the queue is
/// drained it answers with the fallback token list. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    queue: Arc<Mutex<VecDeque<ScriptedResponse>>>,
    fallback: Arc<Mutex<Vec<Token>>>,
    details: Arc<Mutex<Vec<Token>>>,
    calls: Arc<Mutex<usize>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that always answers with `tokens`
    pub fn always(tokens: Vec<Token>) -> Self {
        let provider = Self::new();
        *provider.fallback.lock().unwrap() = tokens;
        provider
    }

    /// Builder method to queue a successful response
    pub fn with_tokens(self, tokens: Vec<Token>) -> Self {
        self.push(Ok(tokens), Duration::ZERO);
        self
    }

    /// Builder method to queue a failure
    pub fn with_error(self, error: ProviderError) -> Self {
        self.push(Err(error), Duration::ZERO);
        self
    }

    /// Builder method to queue a response that arrives after `delay`
    pub fn with_delayed(self, result: Result<Vec<Token>, ProviderError>, delay: Duration) -> Self {
        self.push(result, delay);
        self
    }

    /// Builder method to register a token for detail lookups
    pub fn with_detail(self, token: Token) -> Self {
        self.details.lock().unwrap().push(token);
        self
    }

    pub fn push(&self, result: Result<Vec<Token>, ProviderError>, delay: Duration) {
        self.queue
            .lock()
            .unwrap()
            .push_back(ScriptedResponse { result, delay });
    }

    /// Number of `fetch_tokens` calls so far
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }
}

#[async_trait]
impl TokenProvider for ScriptedProvider {
    async fn fetch_tokens(&self) -> Result<Vec<Token>, ProviderError> {
        *self.calls.lock().unwrap() += 1;
        let next = self.queue.lock().unwrap().pop_front();

        match next {
            Some(response) => {
                if !response.delay.is_zero() {
                    tokio::time::sleep(response.delay).await;
                }
                response.result
            }
            None => {
                let tokens = self.fallback.lock().unwrap().clone();
                Ok(tokens)
            }
        }
    }

    async fn fetch_token(&self, address: &str) -> Result<Token, ProviderError> {
        self.details
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.address == address)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(address.to_string()))
    }
}
