//! Adapters Layer - External integrations
//!
//! - `dexscreener`: Market data provider implementing `TokenProvider`
//! - `cli`: Command-line surface and terminal rendering

pub mod cli;
pub mod dexscreener;
