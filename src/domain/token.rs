//! Token Records
//!
//! Canonical token record, ranked snapshots and market summaries.
//! Everything here is recreated wholesale on every fetch cycle.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical token record shared by every layer of the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Token mint address, unique within one snapshot
    pub address: String,
    pub name: String,
    pub symbol: String,
    /// Logo URL when the provider sends one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Current price in USD
    pub price_usd: f64,
    /// 24h price change in percent
    pub price_change_24h: f64,
    /// 7d price change in percent (None = unknown, not zero)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_change_7d: Option<f64>,
    /// 24h trading volume in USD
    pub volume_24h: f64,
    /// Market capitalization in USD (0 when unknown)
    pub market_cap: f64,
    /// Pool liquidity in USD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holders: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Provider page for the token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair_url: Option<String>,
    /// 1-based leaderboard position, 0 until ranked
    #[serde(default)]
    pub rank: u32,
}

impl Token {
    /// Create an unranked token with the required fields set and analytics unknown
    pub fn new(address: impl Into<String>, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
            symbol: symbol.into(),
            image: None,
            price_usd: 0.0,
            price_change_24h: 0.0,
            price_change_7d: None,
            volume_24h: 0.0,
            market_cap: 0.0,
            liquidity: None,
            holders: None,
            created_at: None,
            pair_url: None,
            rank: 0,
        }
    }

    pub fn with_price(mut self, price_usd: f64) -> Self {
        self.price_usd = price_usd;
        self
    }

    pub fn with_market_cap(mut self, market_cap: f64) -> Self {
        self.market_cap = market_cap;
        self
    }

    pub fn with_volume(mut self, volume_24h: f64) -> Self {
        self.volume_24h = volume_24h;
        self
    }

    pub fn with_change_24h(mut self, change: f64) -> Self {
        self.price_change_24h = change;
        self
    }

    pub fn with_liquidity(mut self, liquidity: f64) -> Self {
        self.liquidity = Some(liquidity);
        self
    }
}

/// Ranking window selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Ranked by market capitalization
    #[default]
    Recent,
    /// Ranked by traded volume
    Volume,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Recent => "recent",
            Period::Volume => "volume",
        }
    }

    /// Human label used by the render surface
    pub fn label(&self) -> &'static str {
        match self {
            Period::Recent => "24 Hours",
            Period::Volume => "Top Volume",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recent" | "24h" | "mcap" => Ok(Period::Recent),
            "volume" | "7d" | "vol" => Ok(Period::Volume),
            other => Err(format!("unknown period '{}' (expected recent or volume)", other)),
        }
    }
}

/// Whether a well-formed snapshot carries any tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataCondition {
    Data,
    /// Provider answered but nothing survived (not an error)
    NoData,
}

/// One fetch cycle's ranked, immutable token set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub period: Period,
    pub tokens: Vec<Token>,
    pub fetched_at: DateTime<Utc>,
    pub condition: DataCondition,
}

impl Snapshot {
    /// Build a snapshot from tokens already in final order, assigning ranks 1..=n
    pub fn ranked(period: Period, mut tokens: Vec<Token>, fetched_at: DateTime<Utc>) -> Self {
        assign_ranks(&mut tokens);
        let condition = if tokens.is_empty() {
            DataCondition::NoData
        } else {
            DataCondition::Data
        };

        Self {
            period,
            tokens,
            fetched_at,
            condition,
        }
    }

    pub fn empty(period: Period, fetched_at: DateTime<Utc>) -> Self {
        Self::ranked(period, Vec::new(), fetched_at)
    }

    pub fn is_no_data(&self) -> bool {
        self.condition == DataCondition::NoData
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, address: &str) -> Option<&Token> {
        self.tokens.iter().find(|t| t.address == address)
    }
}

/// Overwrite ranks with the 1-based position in the slice
pub fn assign_ranks(tokens: &mut [Token]) {
    for (index, token) in tokens.iter_mut().enumerate() {
        token.rank = index as u32 + 1;
    }
}

/// Best or worst performer of a summary window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopMover {
    pub symbol: String,
    pub address: String,
    /// 24h price change in percent
    pub change: f64,
}

impl TopMover {
    fn from_token(token: &Token) -> Self {
        Self {
            symbol: token.symbol.clone(),
            address: token.address.clone(),
            change: token.price_change_24h,
        }
    }
}

/// Aggregate statistics for the stat cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub total_volume_24h: f64,
    pub active_tokens: usize,
    pub top_gainer: Option<TopMover>,
    pub top_loser: Option<TopMover>,
    pub fetched_at: DateTime<Utc>,
}

impl MarketSummary {
    /// Summarize tokens in a single left-to-right scan.
    ///
    /// Gainer and loser only move on strict improvement, so the first token
    /// seen wins any tie.
    pub fn from_tokens(tokens: &[Token], fetched_at: DateTime<Utc>) -> Self {
        let mut total_volume_24h = 0.0;
        let mut gainer: Option<&Token> = None;
        let mut loser: Option<&Token> = None;

        for token in tokens {
            total_volume_24h += token.volume_24h;

            if gainer.map_or(true, |best| token.price_change_24h > best.price_change_24h) {
                gainer = Some(token);
            }
            if loser.map_or(true, |worst| token.price_change_24h < worst.price_change_24h) {
                loser = Some(token);
            }
        }

        Self {
            total_volume_24h,
            active_tokens: tokens.len(),
            top_gainer: gainer.map(TopMover::from_token),
            top_loser: loser.map(TopMover::from_token),
            fetched_at,
        }
    }
}
