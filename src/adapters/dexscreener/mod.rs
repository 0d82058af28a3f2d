//! DexScreener Adapter
//!
//! Market data for the leaderboard:
//! - `DexScreenerClient`: HTTP client implementing `TokenProvider`
//! - `types`: Optional-field response schema tolerant of provider drift
//! - `normalize`: Raw pair to canonical `Token` mapping

mod client;
pub mod normalize;
pub mod types;

pub use client::{parse_pairs, DexScreenerClient, DexScreenerConfig, DEXSCREENER_BASE_URL, WRAPPED_SOL_MINT};
pub use normalize::convert_to_token;
pub use types::DexPair;
