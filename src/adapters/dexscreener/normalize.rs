//! DexScreener pair → canonical `Token` mapping.

use chrono::{DateTime, TimeZone, Utc};

use crate::domain::Token;
use super::types::DexPair;

/// Map a raw pair onto the canonical token shape.
///
/// Required numerics default to 0 (negative prices, volumes and caps are
/// clamped to 0). Analytics this provider never reports (7d change, holder
/// count) stay `None` so "unknown" is not confused with "zero".
pub fn convert_to_token(pair: &DexPair) -> Token {
    let base = pair.base_token.clone().unwrap_or_default();

    let market_cap = pair
        .market_cap
        .filter(|v| *v > 0.0)
        .or(pair.fdv)
        .unwrap_or(0.0);

    Token {
        address: base.address.unwrap_or_default(),
        name: base.name.unwrap_or_default(),
        symbol: base.symbol.unwrap_or_default(),
        image: pair.info.as_ref().and_then(|i| i.image_url.clone()),
        price_usd: non_negative(pair.price_usd),
        price_change_24h: pair
            .price_change
            .as_ref()
            .and_then(|w| w.h24)
            .unwrap_or(0.0),
        price_change_7d: None,
        volume_24h: non_negative(pair.volume.as_ref().and_then(|w| w.h24)),
        market_cap: non_negative(Some(market_cap)),
        liquidity: pair
            .liquidity
            .as_ref()
            .and_then(|l| l.usd)
            .map(|usd| usd.max(0.0)),
        holders: None,
        created_at: pair.pair_created_at.and_then(millis_to_datetime),
        pair_url: pair.url.clone(),
        rank: 0,
    }
}

fn non_negative(value: Option<f64>) -> f64 {
    value.filter(|v| *v > 0.0).unwrap_or(0.0)
}

fn millis_to_datetime(millis: f64) -> Option<DateTime<Utc>> {
    if millis <= 0.0 {
        return None;
    }
    Utc.timestamp_millis_opt(millis as i64).single()
}
