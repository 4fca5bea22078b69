//! Timestamp parsing and normalization to naive UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 timestamp or date.
///
/// Values with an offset (`Z`, `+02:00`) are converted to UTC and the
/// offset dropped; bare dates mean midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Canonical timezone-naive ISO-8601 rendering of a timestamp string.
///
/// Unparseable input is returned trimmed.
pub fn normalize_timestamp(value: &str) -> String {
    parse_timestamp(value).map_or_else(|| value.trim().to_string(), |dt| format_iso(&dt))
}

/// `YYYY-MM-DDTHH:MM:SS[.ffffff]`, matching the stored representation.
pub(crate) fn format_iso(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

pub(super) fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_timestamp(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{s}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2024-03-01"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T00:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T01:00:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("next tuesday"), None);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_timestamp("2024-03-01"), "2024-03-01T00:00:00");
        assert_eq!(normalize_timestamp("2024-03-01T10:30:00Z"), "2024-03-01T10:30:00");
        assert_eq!(normalize_timestamp("  soon "), "soon");
    }
}
