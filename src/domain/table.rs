//! Leaderboard Table View Model
//!
//! Derives the display list from a snapshot plus the user's sort and search
//! state. Pure: the same inputs always produce the same order.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::token::{Snapshot, Token};

/// Sortable token column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Rank,
    Name,
    Symbol,
    Address,
    PriceUsd,
    PriceChange24h,
    PriceChange7d,
    Volume24h,
    MarketCap,
    Liquidity,
    Holders,
    CreatedAt,
}

/// Column value as seen by the comparator
enum SortValue<'a> {
    Number(Option<f64>),
    Text(&'a str),
}

impl SortKey {
    pub const ALL: [SortKey; 12] = [
        SortKey::Rank,
        SortKey::Name,
        SortKey::Symbol,
        SortKey::Address,
        SortKey::PriceUsd,
        SortKey::PriceChange24h,
        SortKey::PriceChange7d,
        SortKey::Volume24h,
        SortKey::MarketCap,
        SortKey::Liquidity,
        SortKey::Holders,
        SortKey::CreatedAt,
    ];

    /// Field name as it appears on the serialized token
    pub fn field_name(&self) -> &'static str {
        match self {
            SortKey::Rank => "rank",
            SortKey::Name => "name",
            SortKey::Symbol => "symbol",
            SortKey::Address => "address",
            SortKey::PriceUsd => "priceUsd",
            SortKey::PriceChange24h => "priceChange24h",
            SortKey::PriceChange7d => "priceChange7d",
            SortKey::Volume24h => "volume24h",
            SortKey::MarketCap => "marketCap",
            SortKey::Liquidity => "liquidity",
            SortKey::Holders => "holders",
            SortKey::CreatedAt => "createdAt",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, SortKey::Name | SortKey::Symbol | SortKey::Address)
    }

    fn value<'a>(&self, token: &'a Token) -> SortValue<'a> {
        match self {
            SortKey::Rank => SortValue::Number(Some(token.rank as f64)),
            SortKey::Name => SortValue::Text(&token.name),
            SortKey::Symbol => SortValue::Text(&token.symbol),
            SortKey::Address => SortValue::Text(&token.address),
            SortKey::PriceUsd => SortValue::Number(Some(token.price_usd)),
            SortKey::PriceChange24h => SortValue::Number(Some(token.price_change_24h)),
            SortKey::PriceChange7d => SortValue::Number(token.price_change_7d),
            SortKey::Volume24h => SortValue::Number(Some(token.volume_24h)),
            SortKey::MarketCap => SortValue::Number(Some(token.market_cap)),
            SortKey::Liquidity => SortValue::Number(token.liquidity),
            SortKey::Holders => SortValue::Number(token.holders.map(|h| h as f64)),
            SortKey::CreatedAt => {
                SortValue::Number(token.created_at.map(|t| t.timestamp_millis() as f64))
            }
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

impl FromStr for SortKey {
    type Err = String;

    /// Accepts field names in camelCase, snake_case or kebab-case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        SortKey::ALL
            .iter()
            .copied()
            .find(|key| key.field_name().to_ascii_lowercase() == wanted)
            .or(match wanted.as_str() {
                "price" => Some(SortKey::PriceUsd),
                "volume" => Some(SortKey::Volume24h),
                "mcap" => Some(SortKey::MarketCap),
                "change" => Some(SortKey::PriceChange24h),
                _ => None,
            })
            .ok_or_else(|| format!("unknown sort key '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: SortKey::Volume24h,
            direction: SortDirection::Descending,
        }
    }
}

impl SortState {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Same key flips direction; a new key starts descending
    pub fn toggled(self, key: SortKey) -> Self {
        if self.key == key {
            Self::new(key, self.direction.flipped())
        } else {
            Self::new(key, SortDirection::Descending)
        }
    }

    pub fn compare(&self, a: &Token, b: &Token) -> Ordering {
        match (self.key.value(a), self.key.value(b)) {
            (SortValue::Number(x), SortValue::Number(y)) => match (x, y) {
                (Some(x), Some(y)) => self.direction.apply(x.total_cmp(&y)),
                // Missing values sink to the bottom in both directions
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            (SortValue::Text(x), SortValue::Text(y)) => self.direction.apply(locale_cmp(x, y)),
            _ => Ordering::Equal,
        }
    }
}

/// Case-folded ordering; on case-only differences lowercase sorts first
fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Free-text token filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchState {
    query: String,
}

impl SearchState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    /// Case-insensitive substring match on name, symbol or address
    pub fn matches(&self, token: &Token) -> bool {
        if self.query.is_empty() {
            return true;
        }

        let needle = self.query.to_lowercase();
        token.name.to_lowercase().contains(&needle)
            || token.symbol.to_lowercase().contains(&needle)
            || token.address.to_lowercase().contains(&needle)
    }
}

/// Sort and search state that survives across polls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableView {
    sort: SortState,
    search: SearchState,
}

impl TableView {
    pub fn new(sort: SortState, search: SearchState) -> Self {
        Self { sort, search }
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn set_sort(&mut self, sort: SortState) {
        self.sort = sort;
    }

    /// Header-click semantics
    pub fn toggle_sort(&mut self, key: SortKey) {
        self.sort = self.sort.toggled(key);
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = SearchState::new(query);
    }

    pub fn apply(&self, snapshot: &Snapshot) -> Vec<Token> {
        view(&snapshot.tokens, &self.sort, &self.search)
    }
}

/// Filter then stable-sort a copy of `tokens`
pub fn view(tokens: &[Token], sort: &SortState, search: &SearchState) -> Vec<Token> {
    let mut rows: Vec<Token> = tokens
        .iter()
        .filter(|t| search.matches(t))
        .cloned()
        .collect();
    rows.sort_by(|a, b| sort.compare(a, b));
    rows
}
