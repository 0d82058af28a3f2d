//! DexScreener Response Schema
//!
//! Strict optional-field schema for `/dex/tokens/{address}` responses.
//! Every field may be missing, `null` or mistyped across API versions, so
//! numbers accept JSON numbers or numeric strings and anything unusable
//! becomes `None` instead of failing the whole pair.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Alternate spellings seen in pair payloads, keyed by the camelCase name
const PAIR_KEY_ALIASES: &[(&str, &[&str])] = &[
    ("chainId", &["chain_id"]),
    ("dexId", &["dex_id"]),
    ("pairAddress", &["pair_address"]),
    ("baseToken", &["base_token"]),
    ("quoteToken", &["quote_token"]),
    ("priceNative", &["price_native"]),
    ("priceUsd", &["price_usd", "priceUSD"]),
    ("priceChange", &["price_change"]),
    ("marketCap", &["market_cap", "marketcap"]),
    ("pairCreatedAt", &["pair_created_at"]),
];

const INFO_KEY_ALIASES: &[(&str, &[&str])] = &[("imageUrl", &["image_url"])];

/// Fold alternate key spellings into their camelCase key.
///
/// The camelCase key wins when present, otherwise the first alias in table
/// order; the other spellings are discarded.
fn canonicalize_keys(map: &mut Map<String, Value>, aliases: &[(&str, &[&str])]) {
    for (canonical, alternates) in aliases {
        for alternate in alternates.iter() {
            if let Some(value) = map.remove(*alternate) {
                map.entry(canonical.to_string()).or_insert(value);
            }
        }
    }
}

/// Lenient f64: numbers or numeric strings, non-finite and junk become None
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_f64))
}

/// Lenient string: strings pass through, numbers are stringified
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Lenient object: anything that is not the expected object becomes None
pub(crate) fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .filter(Value::is_object)
        .and_then(|v| serde_json::from_value(v).ok()))
}

pub(crate) fn value_to_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// One trading pair as DexScreener reports it
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexPair {
    #[serde(default, deserialize_with = "lenient_string")]
    pub chain_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub dex_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pair_address: Option<String>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub base_token: Option<DexToken>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub quote_token: Option<DexToken>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price_native: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price_usd: Option<f64>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub volume: Option<DexWindows>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub price_change: Option<DexWindows>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub liquidity: Option<DexLiquidity>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fdv: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub market_cap: Option<f64>,
    /// Pair creation time in Unix milliseconds
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pair_created_at: Option<f64>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub info: Option<DexInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DexToken {
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub symbol: Option<String>,
}

/// Per-window figures (volume or price change)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DexWindows {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub m5: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub h1: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub h6: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub h24: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DexLiquidity {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub usd: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub base: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quote: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_url: Option<String>,
}

impl DexPair {
    /// Deserialize one pair, accepting mixed key casing
    pub fn from_value(mut value: Value) -> Result<Self, serde_json::Error> {
        if let Value::Object(map) = &mut value {
            canonicalize_keys(map, PAIR_KEY_ALIASES);
            if let Some(Value::Object(info)) = map.get_mut("info") {
                canonicalize_keys(info, INFO_KEY_ALIASES);
            }
        }
        serde_json::from_value(value)
    }

    pub fn base_address(&self) -> Option<&str> {
        self.base_token.as_ref().and_then(|t| t.address.as_deref())
    }
}
