//! Display helpers shared by every view.

use chrono::{DateTime, Utc};

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Whole US dollars with thousands separators. Missing values render as `$0`.
pub fn format_currency(cents: Option<i64>) -> String {
    let cents = cents.unwrap_or(0);
    let dollars = (cents as f64 / 100.0).round() as i64;
    let grouped = group_thousands(&dollars.unsigned_abs().to_string());
    if dollars < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// `Jan 05, 2025`
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%b %d, %Y").to_string()
}

/// `Jan 05, 2025 at 3:04 PM`
pub fn format_date_time(at: DateTime<Utc>) -> String {
    format!("{} at {}", format_date(at), at.format("%-I:%M %p"))
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

/// `3 days ago`, `in 2 hours`, `just now`.
pub fn format_relative(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(at);
    let seconds = delta.num_seconds();
    let magnitude = seconds.abs();
    if magnitude < 45 {
        return "just now".to_string();
    }
    let phrase = match magnitude {
        s if s < 3_600 => plural((s / 60).max(1), "minute"),
        s if s < 86_400 => plural(s / 3_600, "hour"),
        s if s < 30 * 86_400 => plural(s / 86_400, "day"),
        s if s < 365 * 86_400 => plural(s / (30 * 86_400), "month"),
        s => plural(s / (365 * 86_400), "year"),
    };
    if seconds > 0 {
        format!("{phrase} ago")
    } else {
        format!("in {phrase}")
    }
}

/// Ten-digit numbers render as `(555) 123-4567`; anything else is returned as given.
pub fn format_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 10 {
        format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..])
    } else {
        raw.to_string()
    }
}

/// Up to two uppercase initials, `?` for a blank name.
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();
    if letters.is_empty() {
        "?".to_string()
    } else {
        letters
    }
}

/// `950`, `1.5K`, `2.0M`.
pub fn format_compact(value: i64) -> String {
    let magnitude = value.unsigned_abs();
    let sign = if value < 0 { "-" } else { "" };
    if magnitude >= 1_000_000 {
        format!("{sign}{:.1}M", magnitude as f64 / 1_000_000.0)
    } else if magnitude >= 1_000 {
        format!("{sign}{:.1}K", magnitude as f64 / 1_000.0)
    } else {
        value.to_string()
    }
}
