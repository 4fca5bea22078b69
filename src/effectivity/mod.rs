//! Effectivity: contextual conditions under which a BOM line is active.
//!
//! A relationship may carry any number of [`Effectivity`] records. The line
//! is effective when it has no records at all, or when **any** record
//! matches the [`EffectivityContext`]:
//!
//! | kind   | matches when                                              |
//! |--------|-----------------------------------------------------------|
//! | Date   | `start <= reference_date <= end` (open bounds are infinite)|
//! | Lot    | `lot_start <= lot_number <= lot_end`, compared as strings  |
//! | Serial | `serial_number` is listed in `payload.serials`             |
//! | Unit   | `unit_position` is listed in `payload.unit_positions`      |
//!
//! Lot, Serial and Unit records never match a context lacking the field
//! they test. Timestamps carrying an offset are normalized to naive UTC.

mod timestamp;

pub use timestamp::{normalize_timestamp, parse_timestamp};
pub(crate) use timestamp::format_iso;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Context for effectivity checks. Only the fields relevant to a record's
/// kind are consulted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivityContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_position: Option<String>,
}

impl EffectivityContext {
    /// Context pinned to a reference date
    pub const fn at(reference_date: NaiveDateTime) -> Self {
        Self {
            reference_date: Some(reference_date),
            lot_number: None,
            serial_number: None,
            unit_position: None,
        }
    }

    #[must_use]
    pub fn with_lot(mut self, lot: impl Into<String>) -> Self {
        self.lot_number = Some(lot.into());
        self
    }

    #[must_use]
    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial_number = Some(serial.into());
        self
    }

    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit_position = Some(unit.into());
        self
    }

    /// True when no field is set
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.reference_date.is_none()
            && self.lot_number.is_none()
            && self.serial_number.is_none()
            && self.unit_position.is_none()
    }
}

/// Kind of an effectivity record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EffectivityKind {
    Date,
    Lot,
    Serial,
    Unit,
}

impl std::fmt::Display for EffectivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Date => write!(f, "Date"),
            Self::Lot => write!(f, "Lot"),
            Self::Serial => write!(f, "Serial"),
            Self::Unit => write!(f, "Unit"),
        }
    }
}

/// One effectivity record attached to an item or relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effectivity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Item or relationship the record applies to
    pub item_id: String,
    #[serde(rename = "effectivity_type", alias = "type")]
    pub kind: EffectivityKind,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "timestamp::deserialize_opt"
    )]
    pub start_date: Option<NaiveDateTime>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "timestamp::deserialize_opt"
    )]
    pub end_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

impl Effectivity {
    /// Date window record
    pub fn date(
        item_id: impl Into<String>,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            id: None,
            item_id: item_id.into(),
            kind: EffectivityKind::Date,
            start_date: start,
            end_date: end,
            payload: Value::Null,
        }
    }

    /// Non-date record with a kind-specific payload
    pub fn with_payload(item_id: impl Into<String>, kind: EffectivityKind, payload: Value) -> Self {
        Self {
            id: None,
            item_id: item_id.into(),
            kind,
            start_date: None,
            end_date: None,
            payload,
        }
    }

    /// Check this record against a context.
    #[must_use]
    pub fn matches(&self, ctx: &EffectivityContext) -> bool {
        match self.kind {
            EffectivityKind::Date => self.matches_date(ctx),
            EffectivityKind::Lot => self.matches_lot(ctx),
            EffectivityKind::Serial => {
                payload_contains(&self.payload, "serials", ctx.serial_number.as_deref())
            }
            EffectivityKind::Unit => {
                payload_contains(&self.payload, "unit_positions", ctx.unit_position.as_deref())
            }
        }
    }

    /// A date record with no reference date in the context is checked
    /// against "now".
    fn matches_date(&self, ctx: &EffectivityContext) -> bool {
        let reference = ctx
            .reference_date
            .unwrap_or_else(|| chrono::Utc::now().naive_utc());
        if self.start_date.is_some_and(|start| reference < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| reference > end) {
            return false;
        }
        true
    }

    fn matches_lot(&self, ctx: &EffectivityContext) -> bool {
        let Some(lot) = ctx.lot_number.as_deref().filter(|l| !l.is_empty()) else {
            return false;
        };
        let bound = |key: &str| {
            self.payload
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        };
        if bound("lot_start").is_some_and(|start| lot < start) {
            return false;
        }
        if bound("lot_end").is_some_and(|end| lot > end) {
            return false;
        }
        true
    }
}

fn payload_contains(payload: &Value, key: &str, needle: Option<&str>) -> bool {
    let Some(needle) = needle.filter(|n| !n.is_empty()) else {
        return false;
    };
    payload
        .get(key)
        .and_then(Value::as_array)
        .is_some_and(|items| items.iter().any(|v| v.as_str() == Some(needle)))
}

/// OR-combine records: effective when there are none or any matches.
#[must_use]
pub fn any_effective(records: &[Effectivity], ctx: &EffectivityContext) -> bool {
    records.is_empty() || records.iter().any(|r| r.matches(ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).expect("valid timestamp")
    }

    #[test]
    fn test_date_window() {
        let eff = Effectivity::date("r1", Some(ts("2024-01-01")), Some(ts("2024-12-31T23:59:59")));
        assert!(eff.matches(&EffectivityContext::at(ts("2024-06-01T12:00:00"))));
        assert!(!eff.matches(&EffectivityContext::at(ts("2023-12-31T00:00:00"))));
        assert!(!eff.matches(&EffectivityContext::at(ts("2025-01-01T00:00:00"))));
    }

    #[test]
    fn test_open_date_bounds() {
        let eff = Effectivity::date("r1", None, Some(ts("2024-01-01")));
        assert!(eff.matches(&EffectivityContext::at(ts("1990-01-01"))));
        let eff = Effectivity::date("r1", Some(ts("2024-01-01")), None);
        assert!(eff.matches(&EffectivityContext::at(ts("2099-01-01"))));
    }

    #[test]
    fn test_lot_range_requires_lot() {
        let eff = Effectivity::with_payload(
            "r1",
            EffectivityKind::Lot,
            json!({"lot_start": "L100", "lot_end": "L200"}),
        );
        assert!(eff.matches(&EffectivityContext::default().with_lot("L150")));
        assert!(!eff.matches(&EffectivityContext::default().with_lot("L300")));
        assert!(!eff.matches(&EffectivityContext::default()));
    }

    #[test]
    fn test_serial_and_unit_membership() {
        let serial = Effectivity::with_payload(
            "r1",
            EffectivityKind::Serial,
            json!({"serials": ["SN-1", "SN-2"]}),
        );
        assert!(serial.matches(&EffectivityContext::default().with_serial("SN-2")));
        assert!(!serial.matches(&EffectivityContext::default().with_serial("SN-3")));

        let unit = Effectivity::with_payload(
            "r1",
            EffectivityKind::Unit,
            json!({"unit_positions": ["U1"]}),
        );
        assert!(unit.matches(&EffectivityContext::default().with_unit("U1")));
        assert!(!unit.matches(&EffectivityContext::default().with_serial("U1")));
    }

    #[test]
    fn test_any_effective_or_logic() {
        let ctx = EffectivityContext::default().with_serial("SN-9");
        assert!(any_effective(&[], &ctx));

        let records = vec![
            Effectivity::with_payload("r1", EffectivityKind::Lot, json!({"lot_start": "A"})),
            Effectivity::with_payload("r1", EffectivityKind::Serial, json!({"serials": ["SN-9"]})),
        ];
        assert!(any_effective(&records, &ctx));
        assert!(!any_effective(&records[..1], &ctx));
    }

    #[test]
    fn test_record_deserialize_with_offset() {
        let eff: Effectivity = serde_json::from_value(json!({
            "item_id": "r1",
            "effectivity_type": "Date",
            "start_date": "2024-01-01T02:00:00+02:00"
        }))
        .unwrap();
        assert_eq!(eff.start_date, Some(ts("2024-01-01T00:00:00")));
    }
}
