//! Caller-supplied configuration selections.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Option name -> selected value(s), immutable for one traversal.
///
/// Lookups are case-insensitive on the option name. A value may be a
/// scalar, a list of scalars, or a structured entry such as
/// `{"value": "Red"}` which is unwrapped on access.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigSelection(IndexMap<String, Value>);

impl ConfigSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection from `(option, value)` pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn insert(&mut self, option: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(option.into(), value.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Resolve an option case-insensitively, unwrapping structured entries.
    ///
    /// An exact-case key wins over a case-folded match.
    pub fn resolve(&self, option: &str) -> Option<&Value> {
        let raw = self.0.get(option).or_else(|| {
            self.0
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(option))
                .map(|(_, v)| v)
        })?;
        Some(unwrap_entry(raw))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

/// Unwrap `{"value": x}` / `{"values": [..]}` / `{"selected": x}` entries.
fn unwrap_entry(value: &Value) -> &Value {
    match value {
        Value::Object(map) => ["value", "values", "selected"]
            .iter()
            .find_map(|k| map.get(*k))
            .unwrap_or(value),
        _ => value,
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ConfigSelection {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_case_insensitive() {
        let sel = ConfigSelection::from_pairs([("Color", "Red")]);
        assert_eq!(sel.resolve("color"), Some(&json!("Red")));
        assert_eq!(sel.resolve("COLOR"), Some(&json!("Red")));
        assert_eq!(sel.resolve("size"), None);
    }

    #[test]
    fn test_resolve_unwraps_structured_entry() {
        let sel: ConfigSelection =
            serde_json::from_value(json!({"Voltage": {"value": 220, "label": "EU"}})).unwrap();
        assert_eq!(sel.resolve("voltage"), Some(&json!(220)));
    }
}
