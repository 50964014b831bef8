//! Helper functions and utilities
//!
//! This module contains small formatting helpers shared by the library and
//! the command line front end.

use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};

/// Format a timestamp in the given zone for display
pub fn format_timestamp<Tz>(timestamp: DateTime<Utc>, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    timestamp.with_timezone(zone).format("%Y-%m-%d %H:%M").to_string()
}

/// Format a distance, switching to meters below one kilometer
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{:.0} m", km * 1000.0)
    } else if km < 100.0 {
        format!("{:.1} km", km)
    } else {
        format!("{:.0} km", km)
    }
}

/// Format an optional capacity; absence means unlimited
pub fn format_capacity(capacity: Option<u32>) -> String {
    match capacity {
        Some(capacity) => capacity.to_string(),
        None => "unlimited".to_string(),
    }
}

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
