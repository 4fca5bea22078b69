//! Pure evaluation of [`ConditionExpr`] against a [`ConfigSelection`].

use super::ast::{CompareOp, ConditionExpr, Leaf};
use crate::model::ConfigSelection;
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;

impl ConditionExpr {
    /// Evaluate against a selection. `All([])` is true, `Any([])` false.
    #[must_use]
    pub fn evaluate(&self, selection: &ConfigSelection) -> bool {
        match self {
            Self::All { all } => all.iter().all(|e| e.evaluate(selection)),
            Self::Any { any } => any.iter().any(|e| e.evaluate(selection)),
            Self::Not { not } => !not.evaluate(selection),
            Self::Leaf(leaf) => leaf.evaluate(selection),
        }
    }
}

impl Leaf {
    #[must_use]
    pub fn evaluate(&self, selection: &ConfigSelection) -> bool {
        let selected = selection.resolve(&self.option).filter(|v| !is_empty(v));

        if let Some(missing) = self.missing {
            return missing == selected.is_none();
        }
        if let Some(exists) = self.exists {
            return exists == selected.is_some();
        }

        let Some(selected) = selected else {
            return false;
        };
        let elements = elements(selected);

        match self.op {
            CompareOp::Eq => self.any_ordering(&elements, |o| o == Ordering::Equal),
            CompareOp::Ne => !self.any_ordering(&elements, |o| o == Ordering::Equal),
            CompareOp::Gt => self.any_ordering(&elements, |o| o == Ordering::Greater),
            CompareOp::Lt => self.any_ordering(&elements, |o| o == Ordering::Less),
            CompareOp::Gte => self.any_ordering(&elements, |o| o != Ordering::Less),
            CompareOp::Lte => self.any_ordering(&elements, |o| o != Ordering::Greater),
            CompareOp::In => self.in_candidates(&elements),
            CompareOp::NotIn => !self.in_candidates(&elements),
            CompareOp::Between => self.between(&elements),
            CompareOp::Contains => self.contains(selected),
            CompareOp::Regex => self.regex_match(&elements),
        }
    }

    fn any_ordering(&self, elements: &[&Value], accept: impl Fn(Ordering) -> bool) -> bool {
        let Some(expected) = self.value.as_ref().filter(|v| !v.is_null()) else {
            return false;
        };
        elements.iter().any(|s| accept(compare_values(s, expected)))
    }

    /// Candidates come from `values`, else from `value` (a list or a scalar).
    fn candidates(&self) -> Vec<&Value> {
        if let Some(values) = &self.values {
            return values.iter().collect();
        }
        match &self.value {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(v) => vec![v],
        }
    }

    fn in_candidates(&self, elements: &[&Value]) -> bool {
        let candidates = self.candidates();
        elements.iter().any(|s| {
            candidates
                .iter()
                .any(|c| compare_values(s, c) == Ordering::Equal)
        })
    }

    fn between(&self, elements: &[&Value]) -> bool {
        let (min, max) = match (&self.min, &self.max) {
            (None, None) => {
                let candidates = self.candidates();
                (candidates.first().copied(), candidates.get(1).copied())
            }
            (min, max) => (min.as_ref(), max.as_ref()),
        };
        if min.is_none() && max.is_none() {
            return false;
        }
        elements.iter().any(|s| {
            min.map_or(true, |lo| compare_values(s, lo) != Ordering::Less)
                && max.map_or(true, |hi| compare_values(s, hi) != Ordering::Greater)
        })
    }

    fn contains(&self, selected: &Value) -> bool {
        let Some(expected) = self.value.as_ref().filter(|v| !v.is_null()) else {
            return false;
        };
        match selected {
            Value::Array(items) => items
                .iter()
                .any(|item| compare_values(item, expected) == Ordering::Equal),
            other => stringify(other).contains(&*stringify(expected)),
        }
    }

    /// Regex when the pattern compiles, substring otherwise.
    fn regex_match(&self, elements: &[&Value]) -> bool {
        let Some(pattern) = self.value.as_ref().filter(|v| !v.is_null()) else {
            return false;
        };
        let pattern = stringify(pattern);
        match Regex::new(&pattern) {
            Ok(re) => elements.iter().any(|s| re.is_match(&stringify(s))),
            Err(_) => elements
                .iter()
                .any(|s| stringify(s).contains(&*pattern)),
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn elements(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn stringify(value: &Value) -> std::borrow::Cow<'_, str> {
    match value {
        Value::String(s) => std::borrow::Cow::Borrowed(s.trim()),
        other => std::borrow::Cow::Owned(other.to_string()),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Numeric ordering when both sides parse as numbers, string ordering otherwise.
fn compare_values(left: &Value, right: &Value) -> Ordering {
    if let (Some(l), Some(r)) = (as_number(left), as_number(right)) {
        if let Some(ordering) = l.partial_cmp(&r) {
            return ordering;
        }
    }
    stringify(left).cmp(&stringify(right))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sel(value: Value) -> ConfigSelection {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_numeric_vs_string_comparison() {
        let s = sel(json!({"Voltage": "220"}));
        assert!(ConditionExpr::compare("Voltage", CompareOp::Gt, 100).evaluate(&s));
        // "220" > "1000" as strings, but not as numbers
        assert!(!ConditionExpr::compare("Voltage", CompareOp::Gt, "1000").evaluate(&s));
        assert!(ConditionExpr::compare("Voltage", CompareOp::Eq, "220.0").evaluate(&s));
    }

    #[test]
    fn test_missing_selection_is_false_except_presence_checks() {
        let s = sel(json!({"Color": ""}));
        assert!(!ConditionExpr::compare("Color", CompareOp::Ne, "Red").evaluate(&s));

        let mut leaf = Leaf::new("Color", CompareOp::Eq);
        leaf.missing = Some(true);
        assert!(ConditionExpr::Leaf(leaf).evaluate(&s));

        let mut leaf = Leaf::new("Color", CompareOp::Eq);
        leaf.exists = Some(true);
        assert!(!ConditionExpr::Leaf(leaf).evaluate(&s));
    }

    #[test]
    fn test_in_and_between() {
        let s = sel(json!({"Market": "EU", "Size": 42}));
        let leaf = Leaf::new("market", CompareOp::In).with_values(vec![json!("US"), json!("EU")]);
        assert!(ConditionExpr::Leaf(leaf).evaluate(&s));

        let leaf = Leaf::new("Market", CompareOp::NotIn).with_value(json!(["US", "EU"]));
        assert!(!ConditionExpr::Leaf(leaf).evaluate(&s));

        let leaf = Leaf::new("Size", CompareOp::Between).with_range(Some(json!(40)), Some(json!(44)));
        assert!(ConditionExpr::Leaf(leaf).evaluate(&s));
        let leaf = Leaf::new("Size", CompareOp::Between).with_values(vec![json!(43), json!(50)]);
        assert!(!ConditionExpr::Leaf(leaf).evaluate(&s));
    }

    #[test]
    fn test_list_selection_contains_and_regex() {
        let s = sel(json!({"Features": ["Heated Seats", "Sunroof"], "Trim": "Sport Plus"}));
        assert!(ConditionExpr::compare("Features", CompareOp::Contains, "Sunroof").evaluate(&s));
        assert!(ConditionExpr::compare("Trim", CompareOp::Contains, "Plus").evaluate(&s));
        assert!(ConditionExpr::compare("Trim", CompareOp::Regex, "^Sport").evaluate(&s));
        // invalid pattern falls back to substring
        assert!(!ConditionExpr::compare("Trim", CompareOp::Regex, "(Sport").evaluate(&s));
        assert!(ConditionExpr::compare("Features", CompareOp::Eq, "Sunroof").evaluate(&s));
    }

    #[test]
    fn test_combinators() {
        let s = sel(json!({"Color": "Red"}));
        let red = ConditionExpr::compare("Color", CompareOp::Eq, "Red");
        let blue = ConditionExpr::compare("Color", CompareOp::Eq, "Blue");
        assert!(ConditionExpr::any(vec![blue.clone(), red.clone()]).evaluate(&s));
        assert!(!ConditionExpr::all(vec![blue.clone(), red]).evaluate(&s));
        assert!(ConditionExpr::not(blue).evaluate(&s));
        assert!(ConditionExpr::all(vec![]).evaluate(&s));
    }
}
