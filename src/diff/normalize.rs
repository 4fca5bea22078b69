//! Line-key normalization.
//!
//! Raw relationship properties are canonicalized so that formatting
//! differences (`"2.0"` vs `2`, `"R1, r2;R1"` vs `["R1", "R2"]`, key order in
//! nested objects, timestamp offsets) never show up as changes or as
//! different line keys.

use super::mode::LineKeyScheme;
use crate::condition::{parse_condition, ConditionExpr};
use crate::effectivity::{normalize_timestamp, Effectivity};
use crate::model::{parse_quantity, Properties, Substitute, DEFAULT_QUANTITY};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use xxhash_rust::xxh3::xxh3_64;

/// Separator between line key fields
pub const KEY_SEPARATOR: &str = "::";

/// Stand-in for the root item in line keys, so structures mounted under
/// different roots line up.
pub const ROOT_SENTINEL: &str = "ROOT";

/// Quantities are rounded to this many decimal places after arithmetic.
const QUANTITY_SCALE: f64 = 1e9;

/// `(item_id, rank, note)`
pub type SubstituteTuple = (String, Option<i64>, Option<String>);

/// `(type, start, end, canonical payload)`
pub type EffectivityTuple = (String, Option<String>, Option<String>, String);

/// A canonical property value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormValue {
    Null,
    Number(f64),
    Text(String),
    /// Sorted, de-duplicated designators
    List(Vec<String>),
    Substitutes(Vec<SubstituteTuple>),
    Effectivities(Vec<EffectivityTuple>),
    Condition(ConditionExpr),
    /// Any other property, with object keys sorted
    Json(Value),
}

impl NormValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Equality, with numbers compared within `tolerance`.
    #[must_use]
    pub fn equivalent(&self, other: &Self, tolerance: f64) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b || (a - b).abs() <= tolerance,
            _ => self == other,
        }
    }

    /// Stable text form used in line keys and flat exports.
    #[must_use]
    pub fn canonical(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Number(n) => format_quantity(*n),
            Self::Text(s) => s.clone(),
            Self::List(items) => items.join(","),
            Self::Json(Value::String(s)) => s.clone(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}

/// Field name -> canonical value, iterated in name order.
pub type NormalizedProperties = BTreeMap<String, NormValue>;

/// Round to the quantity scale, folding `-0` into `0`.
///
/// Values too large to scale are returned unchanged.
#[must_use]
pub fn round_quantity(value: f64) -> f64 {
    let scaled = value * QUANTITY_SCALE;
    if !scaled.is_finite() {
        return value;
    }
    let rounded = scaled.round() / QUANTITY_SCALE;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// `2.0 -> "2"`, `2.50 -> "2.5"`.
#[must_use]
pub fn format_quantity(value: f64) -> String {
    format!("{}", round_quantity(value))
}

/// Normalize a relationship's raw properties.
///
/// `quantity` is always present (falling back to `qty`, then 1.0).
pub fn normalize(properties: &Properties) -> NormalizedProperties {
    let mut normalized = NormalizedProperties::new();
    for (field, value) in properties {
        if field == "qty" {
            continue;
        }
        normalized.insert(field.clone(), normalize_field(field, value));
    }
    let quantity = properties
        .get("quantity")
        .or_else(|| properties.get("qty"))
        .and_then(parse_quantity)
        .unwrap_or(DEFAULT_QUANTITY);
    normalized.insert("quantity".to_string(), NormValue::Number(round_quantity(quantity)));
    normalized
}

/// Normalize one field according to its name.
pub fn normalize_field(field: &str, value: &Value) -> NormValue {
    if value.is_null() {
        return NormValue::Null;
    }
    match field {
        "quantity" | "qty" => {
            NormValue::Number(round_quantity(parse_quantity(value).unwrap_or(DEFAULT_QUANTITY)))
        }
        "uom" => text(value).map_or(NormValue::Null, |s| NormValue::Text(s.to_uppercase())),
        "find_num" => text(value).map_or(NormValue::Null, NormValue::Text),
        "refdes" => {
            let designators = split_refdes(value);
            if designators.is_empty() {
                NormValue::Null
            } else {
                NormValue::List(designators)
            }
        }
        "effectivity_from" | "effectivity_to" => {
            text(value).map_or(NormValue::Null, |s| NormValue::Text(normalize_timestamp(&s)))
        }
        "config_condition" => match parse_condition(value) {
            Ok(Some(expr)) => NormValue::Condition(expr),
            Ok(None) => NormValue::Null,
            Err(err) => {
                tracing::warn!(%err, "unparseable config_condition kept as-is");
                NormValue::Json(canonical_json(value))
            }
        },
        "substitutes" => normalize_substitute_property(value),
        _ => NormValue::Json(canonical_json(value)),
    }
}

/// Trimmed string form of a scalar; `None` when blank.
fn text(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// Split designators on `;`, `,`, `|` or whitespace; upper-case, dedupe, sort.
#[must_use]
pub fn split_refdes(value: &Value) -> Vec<String> {
    let mut designators: Vec<String> = match value {
        Value::Array(items) => items.iter().flat_map(split_refdes).collect(),
        other => text(other)
            .map(|s| {
                s.split(|c: char| matches!(c, ';' | ',' | '|') || c.is_whitespace())
                    .filter(|part| !part.is_empty())
                    .map(str::to_uppercase)
                    .collect()
            })
            .unwrap_or_default(),
    };
    designators.sort();
    designators.dedup();
    designators
}

fn normalize_substitute_property(value: &Value) -> NormValue {
    let Value::Array(items) = value else {
        return NormValue::Json(canonical_json(value));
    };
    let mut subs = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(id) => subs.push(Substitute::new(id.trim())),
            other => match serde_json::from_value::<Substitute>(other.clone()) {
                Ok(sub) => subs.push(sub),
                Err(_) => return NormValue::Json(canonical_json(value)),
            },
        }
    }
    normalize_substitutes(&subs)
}

/// Sorted `(item_id, rank, note)` tuples.
#[must_use]
pub fn normalize_substitutes(subs: &[Substitute]) -> NormValue {
    let mut tuples: Vec<SubstituteTuple> = subs
        .iter()
        .map(|s| (s.item_id.clone(), s.rank, s.note.clone()))
        .collect();
    tuples.sort();
    NormValue::Substitutes(tuples)
}

/// Sorted `(type, start, end, canonical payload)` tuples.
#[must_use]
pub fn normalize_effectivities(records: &[Effectivity]) -> NormValue {
    let mut tuples: Vec<EffectivityTuple> = records
        .iter()
        .map(|r| {
            (
                r.kind.to_string(),
                r.start_date.as_ref().map(crate::effectivity::format_iso),
                r.end_date.as_ref().map(crate::effectivity::format_iso),
                serde_json::to_string(&canonical_json(&r.payload)).unwrap_or_default(),
            )
        })
        .collect();
    tuples.sort();
    NormValue::Effectivities(tuples)
}

/// Copy of `value` with every object's keys in sorted order.
#[must_use]
pub fn canonical_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonical_json(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical_json).collect()),
        other => other.clone(),
    }
}

/// Identity of one line's endpoints for key building.
#[derive(Debug, Clone, Copy)]
pub struct KeyParts<'a> {
    pub parent_id: &'a str,
    pub parent_config_id: Option<&'a str>,
    pub child_id: &'a str,
    pub child_config_id: Option<&'a str>,
    pub relationship_id: &'a str,
}

/// Build the line key of one edge under `scheme`.
#[must_use]
pub fn build_key(scheme: LineKeyScheme, parts: &KeyParts<'_>, normalized: &NormalizedProperties) -> String {
    if scheme == LineKeyScheme::RelationshipId {
        return parts.relationship_id.to_string();
    }
    let field = |name: &str| normalized.get(name).map(NormValue::canonical).unwrap_or_default();

    let mut fields = vec![base_key(scheme, parts)];
    if scheme == LineKeyScheme::LineFull {
        for name in [
            "find_num",
            "refdes",
            "quantity",
            "uom",
            "effectivity_from",
            "effectivity_to",
        ] {
            fields.push(field(name));
        }
        return fields.join(KEY_SEPARATOR);
    }
    if scheme.includes_find_num() {
        fields.push(field("find_num"));
    }
    if scheme.includes_refdes() {
        fields.push(field("refdes"));
    }
    if scheme.includes_quantity() {
        fields.push(field("quantity"));
    }
    fields.join(KEY_SEPARATOR)
}

/// `parent::child` part of a key, ignoring position fields.
#[must_use]
pub fn base_key(scheme: LineKeyScheme, parts: &KeyParts<'_>) -> String {
    if scheme == LineKeyScheme::RelationshipId {
        return parts.relationship_id.to_string();
    }
    let (parent, child) = if scheme.uses_config() {
        (
            parts.parent_config_id.unwrap_or(parts.parent_id),
            parts.child_config_id.unwrap_or(parts.child_id),
        )
    } else {
        (parts.parent_id, parts.child_id)
    };
    format!("{parent}{KEY_SEPARATOR}{child}")
}

/// 64-bit fingerprint of a line key.
#[must_use]
pub fn line_key_hash(line_key: &str) -> u64 {
    xxh3_64(line_key.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Properties {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn parts<'a>() -> KeyParts<'a> {
        KeyParts {
            parent_id: "P-1",
            parent_config_id: Some("CFG-P"),
            child_id: "C-1",
            child_config_id: None,
            relationship_id: "R-1",
        }
    }

    #[test]
    fn test_quantity_formats_collapse() {
        assert_eq!(
            normalize(&props(json!({"quantity": "2.0"}))),
            normalize(&props(json!({"quantity": 2})))
        );
        assert_eq!(
            normalize(&props(json!({"qty": "3"})))["quantity"],
            NormValue::Number(3.0)
        );
        assert_eq!(normalize(&Properties::new())["quantity"], NormValue::Number(1.0));
        assert_eq!(format_quantity(0.1 + 0.2), "0.3");
        assert_eq!(format_quantity(2.0), "2");
    }

    #[test]
    fn test_huge_quantities_stay_finite() {
        assert_eq!(round_quantity(1e300), 1e300);
        assert_eq!(round_quantity(-1e300), -1e300);
        let huge = normalize(&props(json!({"quantity": 1e300})))["quantity"].clone();
        assert_eq!(huge, NormValue::Number(1e300));
        assert!(huge.equivalent(&huge, 1e-6));
        assert!(NormValue::Number(f64::INFINITY).equivalent(&NormValue::Number(f64::INFINITY), 1e-6));
        assert!(!huge.equivalent(&NormValue::Number(1e299), 1e-6));
    }

    #[test]
    fn test_refdes_set_semantics() {
        assert_eq!(
            normalize(&props(json!({"refdes": "R1, r2;R1"}))),
            normalize(&props(json!({"refdes": ["R1", "R2"]})))
        );
        assert_eq!(
            split_refdes(&json!("c3 | C1\tc2")),
            vec!["C1".to_string(), "C2".to_string(), "C3".to_string()]
        );
        assert_eq!(normalize_field("refdes", &json!(" ; ")), NormValue::Null);
    }

    #[test]
    fn test_scalar_fields() {
        assert_eq!(normalize_field("uom", &json!(" ea ")), NormValue::Text("EA".into()));
        assert_eq!(normalize_field("find_num", &json!(10)), NormValue::Text("10".into()));
        assert_eq!(
            normalize_field("effectivity_from", &json!("2024-01-01T01:00:00+01:00")),
            NormValue::Text("2024-01-01T00:00:00".into())
        );
        assert!(matches!(
            normalize_field("config_condition", &json!("Color=Red")),
            NormValue::Condition(_)
        ));
        assert!(matches!(
            normalize_field("config_condition", &json!("not a condition")),
            NormValue::Json(_)
        ));
    }

    #[test]
    fn test_nested_json_key_order_ignored() {
        let a = normalize_field("notes", &json!({"b": 1, "a": {"y": 2, "x": 1}}));
        let b = normalize_field("notes", &json!({"a": {"x": 1, "y": 2}, "b": 1}));
        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn test_substitute_property_sorted() {
        let a = normalize_field("substitutes", &json!([{"item_id": "Z", "rank": 2}, "A"]));
        let b = normalize_field("substitutes", &json!(["A", {"rank": 2, "item_id": "Z"}]));
        assert_eq!(a, b);
    }

    #[test]
    fn test_build_key_schemes() {
        let normalized = normalize(&props(json!({
            "find_num": " 10 ", "refdes": "r2,R1", "quantity": "2.50", "uom": "ea"
        })));
        let key = |scheme| build_key(scheme, &parts(), &normalized);
        assert_eq!(key(LineKeyScheme::ChildId), "P-1::C-1");
        assert_eq!(key(LineKeyScheme::ChildConfig), "CFG-P::C-1");
        assert_eq!(key(LineKeyScheme::RelationshipId), "R-1");
        assert_eq!(key(LineKeyScheme::ChildConfigFindNum), "CFG-P::C-1::10");
        assert_eq!(key(LineKeyScheme::ChildIdRefdes), "P-1::C-1::R1,R2");
        assert_eq!(key(LineKeyScheme::ChildIdFindRefdes), "P-1::C-1::10::R1,R2");
        assert_eq!(key(LineKeyScheme::ChildConfigFindNumQty), "CFG-P::C-1::10::2.5");
        assert_eq!(key(LineKeyScheme::LineFull), "CFG-P::C-1::10::R1,R2::2.5::EA::::");
    }

    #[test]
    fn test_key_hash_independent_of_field_order() {
        let a = normalize(&props(json!({"find_num": "10", "quantity": 2, "uom": "EA"})));
        let b = normalize(&props(json!({"uom": "ea", "quantity": "2.0", "find_num": "10"})));
        let ka = build_key(LineKeyScheme::LineFull, &parts(), &a);
        let kb = build_key(LineKeyScheme::LineFull, &parts(), &b);
        assert_eq!(ka, kb);
        assert_eq!(line_key_hash(&ka), line_key_hash(&kb));
    }
}
