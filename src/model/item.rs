//! Items (nodes) and relationship items (edges).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Property map carried by nodes and edges.
pub type Properties = serde_json::Map<String, Value>;

/// Relationship type used when a stored edge does not name one.
pub const DEFAULT_RELATIONSHIP_TYPE: &str = "Part BOM";

/// Quantity assumed for a line that carries no (parseable) quantity.
pub const DEFAULT_QUANTITY: f64 = 1.0;

const fn default_true() -> bool {
    true
}

fn default_relationship_type() -> String {
    DEFAULT_RELATIONSHIP_TYPE.to_string()
}

/// An item in the graph store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    /// Identifier shared by all revisions of the item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    /// Only current revisions participate in traversal
    #[serde(default = "default_true")]
    pub is_current: bool,
    #[serde(default)]
    pub properties: Properties,
}

impl Node {
    /// Create a current node with no properties
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            config_id: None,
            item_type: None,
            is_current: true,
            properties: Properties::new(),
        }
    }

    #[must_use]
    pub fn with_config_id(mut self, config_id: impl Into<String>) -> Self {
        self.config_id = Some(config_id.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn superseded(mut self) -> Self {
        self.is_current = false;
        self
    }

    /// Config id, falling back to the raw id
    pub fn config_id_or_id(&self) -> &str {
        self.config_id.as_deref().unwrap_or(&self.id)
    }

    pub fn item_number(&self) -> Option<&str> {
        self.properties.get("item_number").and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").and_then(Value::as_str)
    }
}

/// A relationship item: parent `source_id` uses child `related_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    #[serde(
        rename = "type",
        alias = "relationship_type",
        default = "default_relationship_type"
    )]
    pub relationship_type: String,
    pub source_id: String,
    pub related_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_id: Option<String>,
    #[serde(default = "default_true")]
    pub is_current: bool,
    #[serde(default)]
    pub properties: Properties,
}

impl Edge {
    /// Create a current `Part BOM` edge
    pub fn new(
        id: impl Into<String>,
        source_id: impl Into<String>,
        related_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            relationship_type: default_relationship_type(),
            source_id: source_id.into(),
            related_id: related_id.into(),
            config_id: None,
            is_current: true,
            properties: Properties::new(),
        }
    }

    #[must_use]
    pub fn with_type(mut self, relationship_type: impl Into<String>) -> Self {
        self.relationship_type = relationship_type.into();
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_quantity(self, quantity: impl Into<Value>) -> Self {
        self.with_property("quantity", quantity)
    }

    /// Line quantity, defaulting to 1.0 when absent or unparseable
    pub fn quantity(&self) -> f64 {
        self.properties
            .get("quantity")
            .or_else(|| self.properties.get("qty"))
            .and_then(parse_quantity)
            .unwrap_or(DEFAULT_QUANTITY)
    }

    /// Raw `config_condition` property, if set and non-null
    pub fn config_condition(&self) -> Option<&Value> {
        self.properties
            .get("config_condition")
            .filter(|v| !v.is_null())
    }
}

/// Parse a quantity from a JSON number or numeric string.
pub fn parse_quantity(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|q| q.is_finite()),
        _ => None,
    }
}

/// An alternate item allowed on a BOM line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitute {
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Substitute {
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            rank: None,
            note: None,
        }
    }

    #[must_use]
    pub const fn with_rank(mut self, rank: i64) -> Self {
        self.rank = Some(rank);
        self
    }
}
