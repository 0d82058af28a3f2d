//! Terminal rendering for leaderboard tables, stat cards and token details.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::application::{LeaderboardState, PollPhase};
use crate::domain::format::{
    format_compact, format_currency, format_percentage, format_relative_time, truncate_address,
};
use crate::domain::{MarketSummary, SortDirection, SortKey, SortState, TableView, Token, TopMover};

const NAME_WIDTH: usize = 22;
const PLACEHOLDER: &str = "--";

/// Table columns: header, sort key, width
const COLUMNS: [(&str, SortKey, usize); 6] = [
    ("#", SortKey::Rank, 4),
    ("TOKEN", SortKey::Name, NAME_WIDTH + 10),
    ("PRICE", SortKey::PriceUsd, 14),
    ("24H", SortKey::PriceChange24h, 10),
    ("VOLUME 24H", SortKey::Volume24h, 12),
    ("MARKET CAP", SortKey::MarketCap, 12),
];

fn sort_marker(sort: SortState, key: SortKey) -> &'static str {
    match (sort.key == key, sort.direction) {
        (false, _) => "",
        (true, SortDirection::Ascending) => " ▲",
        (true, SortDirection::Descending) => " ▼",
    }
}

fn header(sort: SortState) -> String {
    let mut line = String::new();
    for (index, (title, key, width)) in COLUMNS.iter().enumerate() {
        let label = format!("{}{}", title, sort_marker(sort, *key));
        if index < 2 {
            let _ = write!(line, "{:<width$}", label, width = width);
        } else {
            let _ = write!(line, "{:>width$}", label, width = width);
        }
    }
    line.trim_end().to_string()
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(width.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

fn row(token: &Token) -> String {
    let label = format!("{} ${}", clip(&token.name, NAME_WIDTH), token.symbol);
    format!(
        "{:<4}{:<w1$}{:>14}{:>10}{:>12}{:>12}",
        token.rank,
        clip(&label, NAME_WIDTH + 9),
        format_currency(token.price_usd, 6),
        format_percentage(token.price_change_24h, 2),
        format!("${}", format_compact(token.volume_24h)),
        format!("${}", format_compact(token.market_cap)),
        w1 = NAME_WIDTH + 10,
    )
}

/// Ranked table with a sort indicator on the active column
pub fn render_table(rows: &[Token], sort: SortState) -> String {
    let mut out = header(sort);
    out.push('\n');
    for token in rows {
        out.push_str(&row(token));
        out.push('\n');
    }
    out
}

fn mover(mover: Option<&TopMover>) -> String {
    match mover {
        Some(m) => format!("{} {}", m.symbol, format_percentage(m.change, 0)),
        None => PLACEHOLDER.to_string(),
    }
}

/// The four stat cards; `None` renders placeholders
pub fn render_stats(summary: Option<&MarketSummary>) -> String {
    let (volume, active) = match summary {
        Some(s) => (
            format!("${}", format_compact(s.total_volume_24h)),
            s.active_tokens.to_string(),
        ),
        None => (PLACEHOLDER.to_string(), PLACEHOLDER.to_string()),
    };

    let mut out = String::new();
    let _ = writeln!(out, "{:<16}{}", "24H Volume", volume);
    let _ = writeln!(out, "{:<16}{}", "Active Tokens", active);
    let _ = writeln!(out, "{:<16}{}", "Top Gainer", mover(summary.and_then(|s| s.top_gainer.as_ref())));
    let _ = writeln!(out, "{:<16}{}", "Top Loser", mover(summary.and_then(|s| s.top_loser.as_ref())));
    out
}

/// Detail card for a single token
pub fn render_token(token: &Token, now: DateTime<Utc>) -> String {
    let optional = |value: Option<String>| value.unwrap_or_else(|| PLACEHOLDER.to_string());

    let mut out = String::new();
    let _ = writeln!(out, "{} (${})", token.name, token.symbol);
    let _ = writeln!(out, "{:<14}{}", "Address", token.address);
    let _ = writeln!(out, "{:<14}{}", "Price", format_currency(token.price_usd, 6));
    let _ = writeln!(out, "{:<14}{}", "24h Change", format_percentage(token.price_change_24h, 2));
    let _ = writeln!(out, "{:<14}{}", "7d Change", optional(token.price_change_7d.map(|c| format_percentage(c, 2))));
    let _ = writeln!(out, "{:<14}${}", "Volume 24h", format_compact(token.volume_24h));
    let _ = writeln!(out, "{:<14}${}", "Market Cap", format_compact(token.market_cap));
    let _ = writeln!(out, "{:<14}{}", "Liquidity", optional(token.liquidity.map(|l| format!("${}", format_compact(l)))));
    let _ = writeln!(out, "{:<14}{}", "Holders", optional(token.holders.map(|h| h.to_string())));
    let _ = writeln!(out, "{:<14}{}", "Listed", optional(token.created_at.map(|t| format_relative_time(t, now))));
    if let Some(url) = &token.pair_url {
        let _ = writeln!(out, "{:<14}{}", "Chart", url);
    }
    out
}

/// Full watch-mode screen for one published state
pub fn render_state(state: &LeaderboardState, view: &TableView, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "NASDANQ Leaderboard - {}", state.period.label());
    out.push_str(&render_stats(state.summary.as_ref()));
    out.push('\n');

    match state.phase {
        PollPhase::Idle => out.push_str("Stopped\n"),
        PollPhase::Loading if state.snapshot.is_none() => out.push_str("Loading leaderboard...\n"),
        PollPhase::Error => {
            let message = state.error.as_deref().unwrap_or("unknown error");
            let _ = writeln!(out, "Failed to load leaderboard: {}", message);
            out.push_str("Type 'retry' to try again\n");
        }
        _ => match state.snapshot.as_deref() {
            Some(snapshot) if !snapshot.is_no_data() => {
                let rows = view.apply(snapshot);
                if rows.is_empty() {
                    let _ = writeln!(out, "No tokens match '{}'", view.search().query());
                } else {
                    out.push_str(&render_table(&rows, view.sort()));
                }
            }
            _ => out.push_str("No tokens found\n"),
        },
    }

    if let Some(updated) = state.updated_at {
        let _ = writeln!(out, "\nUpdated {}", format_relative_time(updated, now));
    }
    if !view.search().is_empty() {
        let _ = writeln!(out, "Search: {}", view.search().query());
    }
    out
}

/// One-line token reference for logs and prompts
pub fn token_label(token: &Token) -> String {
    format!("{} ({})", token.symbol, truncate_address(&token.address, 4))
}
