//! Service-variant duration parsing
//!
//! Variant labels encode the purchased duration as `<minutes> menit`
//! (for example `"Pijat Tradisional 90 Menit"`). A label without that
//! pattern means no countdown applies to the booking.

use std::sync::OnceLock;

use regex::Regex;

fn minutes_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)([0-9]+)\s*menit").ok())
        .as_ref()
}

/// Parse the minutes encoded in a variant label, or `0` when there are none
pub fn parse_duration_minutes(label: &str) -> u64 {
    minutes_pattern()
        .and_then(|pattern| pattern.captures(label))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(0)
}

/// Duration of a variant label in seconds, `0` when no timer applies
pub fn duration_seconds(label: &str) -> u64 {
    parse_duration_minutes(label).saturating_mul(60)
}
