//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, `TokenProvider` abstracts the
//! market-data API so the aggregator never talks HTTP directly.

pub mod market_data;
pub mod mocks;

pub use market_data::{ProviderError, TokenProvider};
pub use mocks::ScriptedProvider;
