//! NASDANQ - Token Leaderboard Library
//!
//! Ranked, searchable and auto-refreshing token leaderboards built from
//! DexScreener market data.
//!
//! # Modules
//!
//! - `domain`: Core records and pure logic (Token, Snapshot, MarketSummary, TableView)
//! - `ports`: Trait abstractions (TokenProvider) and test doubles
//! - `adapters`: External implementations (DexScreener client, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Aggregator and polling controller

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
