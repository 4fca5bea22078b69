//! Configuration conditions on BOM lines.
//!
//! A line's `config_condition` is either absent (always matches), a
//! structured expression, or a shorthand string:
//!
//! | shorthand                     | structured                                          |
//! |-------------------------------|-----------------------------------------------------|
//! | `Color=Red`                   | `{"option": "Color", "op": "eq", "value": "Red"}`   |
//! | `Color=Red; Voltage>=200`     | `{"all": [..two leaves..]}`                         |
//! | `Market=EU \| Market=UK`      | `{"any": [..two leaves..]}`                         |
//! | `!Trim~sport`                 | `{"not": {"option": "Trim", "op": "regex", ..}}`    |
//!
//! Everything is decoded into the closed [`ConditionExpr`] AST and evaluated
//! by a pure recursive function.

mod ast;
mod eval;
mod parser;

pub use ast::{CompareOp, ConditionExpr, Leaf};
pub use parser::parse_shorthand;

use crate::error::{BomError, Result};
use crate::model::ConfigSelection;
use serde_json::Value;

/// Decode a stored condition value.
///
/// `null` and blank strings decode to `None`. Arrays are treated as `all`,
/// and strings nested inside `all`/`any`/`not` are parsed as shorthand.
pub fn parse_condition(value: &Value) -> Result<Option<ConditionExpr>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => parse_shorthand(s),
        Value::Array(items) => Ok(Some(ConditionExpr::all(decode_list(items)?))),
        Value::Object(map) => {
            if let Some(items) = map.get("all") {
                return Ok(Some(ConditionExpr::all(decode_branch(items, "all")?)));
            }
            if let Some(items) = map.get("any") {
                return Ok(Some(ConditionExpr::any(decode_branch(items, "any")?)));
            }
            if let Some(inner) = map.get("not") {
                let inner = parse_condition(inner)?
                    .ok_or_else(|| BomError::invalid("condition 'not' requires an operand"))?;
                return Ok(Some(ConditionExpr::not(inner)));
            }
            let leaf: Leaf = serde_json::from_value(value.clone())
                .map_err(|e| BomError::invalid(format!("invalid condition {value}: {e}")))?;
            Ok(Some(ConditionExpr::Leaf(leaf)))
        }
        other => Err(BomError::invalid(format!(
            "condition must be a string or object, got {other}"
        ))),
    }
}

fn decode_branch(items: &Value, name: &str) -> Result<Vec<ConditionExpr>> {
    match items {
        Value::Array(items) => decode_list(items),
        other => Err(BomError::invalid(format!(
            "condition '{name}' requires a list, got {other}"
        ))),
    }
}

fn decode_list(items: &[Value]) -> Result<Vec<ConditionExpr>> {
    let mut decoded = Vec::with_capacity(items.len());
    for item in items {
        if let Some(expr) = parse_condition(item)? {
            decoded.push(expr);
        }
    }
    Ok(decoded)
}

/// Whether a line with `condition` is selected by `selection`.
///
/// An absent condition always matches. A malformed one is an
/// `InvalidArgument` error.
pub fn matches(condition: Option<&Value>, selection: &ConfigSelection) -> Result<bool> {
    let Some(condition) = condition else {
        return Ok(true);
    };
    Ok(parse_condition(condition)?.map_or(true, |expr| expr.evaluate(selection)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shorthand_matches() {
        let red = ConfigSelection::from_pairs([("Color", "Red")]);
        let blue = ConfigSelection::from_pairs([("Color", "Blue")]);
        let cond = json!("Color=Red");
        assert!(matches(Some(&cond), &red).unwrap());
        assert!(!matches(Some(&cond), &blue).unwrap());
        assert!(matches(None, &ConfigSelection::new()).unwrap());
    }

    #[test]
    fn test_structured_decoding() {
        let cond = json!({
            "any": [
                {"option": "Voltage", "op": ">=", "value": 200},
                {"not": "Market=US"},
                ["Color=Red", {"option": "Trim", "exists": true}]
            ]
        });
        let expr = parse_condition(&cond).unwrap().unwrap();
        let sel = ConfigSelection::from_pairs([("voltage", json!(110)), ("market", json!("US"))]);
        assert!(!expr.evaluate(&sel));
        let sel = ConfigSelection::from_pairs([("Market", "EU")]);
        assert!(expr.evaluate(&sel));
    }

    #[test]
    fn test_structured_roundtrip_shape() {
        let expr = parse_condition(&json!("Color=Red; Size=L")).unwrap().unwrap();
        let value = serde_json::to_value(&expr).unwrap();
        assert_eq!(value["all"][0]["option"], json!("Color"));
        assert_eq!(value["all"][1]["op"], json!("eq"));
        assert_eq!(parse_condition(&value).unwrap(), Some(expr));
    }

    #[test]
    fn test_invalid_inputs() {
        for cond in [json!("Color"), json!({"all": "x"}), json!({"option": "A", "op": "??"}), json!(7)] {
            let err = parse_condition(&cond).unwrap_err();
            assert!(err.is_invalid_argument(), "{cond}: {err}");
        }
    }
}
