//! Display formatting helpers for prices, volumes, percentages and addresses.

use chrono::{DateTime, Utc};

/// Format as USD with thousands separators, e.g. `$1,234.56`
pub fn format_currency(value: f64, decimals: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let formatted = format!("{:.*}", decimals, value.abs());
    let (whole, fraction) = match formatted.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };

    match fraction {
        Some(f) => format!("{}${}.{}", sign, grouped, f),
        None => format!("{}${}", sign, grouped),
    }
}

/// Compact K/M/B notation with two decimals
pub fn format_compact(value: f64) -> String {
    if value >= 1_000_000_000.0 {
        format!("{:.2}B", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("{:.2}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.2}K", value / 1_000.0)
    } else {
        format!("{:.2}", value)
    }
}

/// Signed percentage, e.g. `+12.50%`
pub fn format_percentage(value: f64, decimals: usize) -> String {
    let sign = if value > 0.0 { "+" } else { "" };
    format!("{}{:.*}%", sign, decimals, value)
}

/// Shorten an address to `head...tail`
pub fn truncate_address(address: &str, chars: usize) -> String {
    let count = address.chars().count();
    if count <= chars * 2 {
        return address.to_string();
    }

    let head: String = address.chars().take(chars).collect();
    let tail: String = address.chars().skip(count - chars).collect();
    format!("{}...{}", head, tail)
}

/// Relative age such as `42s ago`, `5m ago`, `3h ago`, `2d ago`; older than
/// a week falls back to `Mon D`.
pub fn format_relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - timestamp).num_seconds().max(0);

    if seconds < 60 {
        format!("{}s ago", seconds)
    } else if seconds < 3_600 {
        format!("{}m ago", seconds / 60)
    } else if seconds < 86_400 {
        format!("{}h ago", seconds / 3_600)
    } else if seconds < 604_800 {
        format!("{}d ago", seconds / 86_400)
    } else {
        timestamp.format("%b %-d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1234.5, 2), "$1,234.50");
        assert_eq!(format_currency(0.000123, 6), "$0.000123");
        assert_eq!(format_currency(1_000_000.0, 0), "$1,000,000");
        assert_eq!(format_currency(-42.0, 2), "-$42.00");
        assert_eq!(format_currency(-0.0001, 2), "$0.00");
        assert_eq!(format_currency(f64::NAN, 2), "$0.00");
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(2_500_000_000.0), "2.50B");
        assert_eq!(format_compact(12_340_000.0), "12.34M");
        assert_eq!(format_compact(1_500.0), "1.50K");
        assert_eq!(format_compact(999.0), "999.00");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(12.5, 2), "+12.50%");
        assert_eq!(format_percentage(-3.0, 1), "-3.0%");
        assert_eq!(format_percentage(0.0, 2), "0.00%");
    }

    #[test]
    fn test_truncate_address() {
        assert_eq!(
            truncate_address("So11111111111111111111111111111111111111112", 4),
            "So11...1112"
        );
        assert_eq!(truncate_address("short", 4), "short");
        assert_eq!(truncate_address("12345678", 4), "12345678");
    }

    #[test]
    fn test_format_relative_time() {
        let now = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
        assert_eq!(format_relative_time(now - Duration::seconds(42), now), "42s ago");
        assert_eq!(format_relative_time(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_relative_time(now - Duration::hours(3), now), "3h ago");
        assert_eq!(format_relative_time(now - Duration::days(2), now), "2d ago");
        assert_eq!(format_relative_time(now - Duration::days(30), now), "Feb 19");
        assert_eq!(format_relative_time(now + Duration::seconds(5), now), "0s ago");
    }
}
