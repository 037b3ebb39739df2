//! Block/page domain model.
//!
//! # Responsibility
//! - Define the canonical data structures persisted under the `pages` key.
//! - Keep per-variant block rules next to the types they govern.
//!
//! # Invariants
//! - Block ids are unique within their page.
//! - Every page owns at least one block.

pub mod block;
pub mod page;

use chrono::DateTime;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall clock as Unix epoch milliseconds.
///
/// Clocks set before the epoch read as `0`.
pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}

/// Timestamp shapes found in persisted data.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireTimestamp {
    Millis(i64),
    Fractional(f64),
    Text(String),
    Null(()),
}

/// Reads epoch milliseconds, also accepting RFC 3339 / ISO-8601 strings
/// such as `2024-05-01T10:00:00.000Z`. `null` reads as `0`.
pub(crate) fn deserialize_epoch_ms<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match WireTimestamp::deserialize(deserializer)? {
        WireTimestamp::Millis(ms) => Ok(ms),
        WireTimestamp::Fractional(ms) => Ok(ms as i64),
        WireTimestamp::Text(text) => parse_timestamp_text(&text)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp `{text}`"))),
        WireTimestamp::Null(()) => Ok(0),
    }
}

fn parse_timestamp_text(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if let Ok(ms) = trimmed.parse::<i64>() {
        return Some(ms);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|parsed| parsed.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::parse_timestamp_text;

    #[test]
    fn iso_timestamps_become_epoch_millis() {
        assert_eq!(
            parse_timestamp_text("2024-01-01T00:00:00.000Z"),
            Some(1_704_067_200_000)
        );
        assert_eq!(
            parse_timestamp_text("2024-01-01T01:00:00+01:00"),
            Some(1_704_067_200_000)
        );
        assert_eq!(parse_timestamp_text(" 1700000000000 "), Some(1_700_000_000_000));
        assert_eq!(parse_timestamp_text("yesterday"), None);
    }
}
