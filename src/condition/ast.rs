//! Closed condition AST.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A configuration condition attached to a BOM line.
///
/// Serializes to the structured form stored on edges:
/// `{"all": [..]}`, `{"any": [..]}`, `{"not": ..}` or a leaf object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionExpr {
    All { all: Vec<ConditionExpr> },
    Any { any: Vec<ConditionExpr> },
    Not { not: Box<ConditionExpr> },
    Leaf(Leaf),
}

impl ConditionExpr {
    pub fn all(items: Vec<Self>) -> Self {
        Self::All { all: items }
    }

    pub fn any(items: Vec<Self>) -> Self {
        Self::Any { any: items }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Self) -> Self {
        Self::Not {
            not: Box::new(inner),
        }
    }

    /// `option <op> value` leaf
    pub fn compare(option: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Leaf(Leaf::new(option, op).with_value(value))
    }
}

/// Comparison against one selected option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaf {
    #[serde(alias = "key")]
    pub option: String,
    #[serde(default)]
    pub op: CompareOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,
    /// Presence check: `true` matches when the option is not selected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing: Option<bool>,
    /// Presence check: `true` matches when the option is selected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
}

impl Leaf {
    pub fn new(option: impl Into<String>, op: CompareOp) -> Self {
        Self {
            option: option.into(),
            op,
            value: None,
            values: None,
            min: None,
            max: None,
            missing: None,
            exists: None,
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_values(mut self, values: Vec<Value>) -> Self {
        self.values = Some(values);
        self
    }

    #[must_use]
    pub fn with_range(mut self, min: Option<Value>, max: Option<Value>) -> Self {
        self.min = min;
        self.max = max;
        self
    }
}

/// Leaf operator. Symbolic spellings are accepted when decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    #[default]
    #[serde(alias = "=", alias = "==")]
    Eq,
    #[serde(alias = "!=", alias = "neq")]
    Ne,
    #[serde(alias = ">")]
    Gt,
    #[serde(alias = "<")]
    Lt,
    #[serde(alias = ">=", alias = "ge")]
    Gte,
    #[serde(alias = "<=", alias = "le")]
    Lte,
    In,
    #[serde(alias = "nin")]
    NotIn,
    #[serde(alias = "range")]
    Between,
    Contains,
    #[serde(alias = "~", alias = "match", alias = "matches")]
    Regex,
}

impl CompareOp {
    /// Symbol used by the shorthand grammar, if any
    #[must_use]
    pub const fn symbol(self) -> Option<&'static str> {
        match self {
            Self::Eq => Some("="),
            Self::Ne => Some("!="),
            Self::Gt => Some(">"),
            Self::Lt => Some("<"),
            Self::Gte => Some(">="),
            Self::Lte => Some("<="),
            Self::Regex => Some("~"),
            Self::In | Self::NotIn | Self::Between | Self::Contains => None,
        }
    }
}
