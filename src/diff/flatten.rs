//! Flattening a [`BomTree`] into line-keyed entries.

use super::mode::LineKeyScheme;
use super::normalize::{
    base_key, build_key, line_key_hash, normalize, normalize_effectivities,
    normalize_substitutes, round_quantity, KeyParts, NormValue, NormalizedProperties,
    ROOT_SENTINEL,
};
use crate::model::{BomTree, EdgeVisit, Node, Properties};
use serde::Serialize;
use std::collections::BTreeMap;

/// Merged unit of measure when aggregated lines disagree
pub const MIXED_UOM: &str = "MIXED";

/// Lightweight node descriptor attached for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeDescriptor {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EdgeDescriptor {
    pub fn of(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            config_id: node.config_id.clone(),
            item_number: node.item_number().map(str::to_string),
            name: node.name().map(str::to_string),
        }
    }
}

/// One comparable BOM line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlattenedEdge {
    pub line_key: String,
    pub parent_id: String,
    pub child_id: String,
    pub relationship_id: String,
    /// Level of the child; 1 for children of the root
    pub level: usize,
    /// Node ids from the root down to the child
    pub path: Vec<String>,
    pub raw_properties: Properties,
    pub normalized_properties: NormalizedProperties,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<EdgeDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child: Option<EdgeDescriptor>,
    /// Further relationship ids folded into this line by aggregation
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub merged_relationship_ids: Vec<String>,
    /// `parent::child` key without position fields
    #[serde(skip)]
    pub(crate) base_key: String,
}

impl FlattenedEdge {
    #[must_use]
    pub fn key_hash(&self) -> u64 {
        line_key_hash(&self.line_key)
    }

    /// Normalized value of `field`, or `Null` when absent
    pub fn value(&self, field: &str) -> &NormValue {
        self.normalized_properties.get(field).unwrap_or(&NormValue::Null)
    }

    pub fn quantity(&self) -> Option<f64> {
        self.value("quantity").as_number()
    }

    /// Fold another physical line with the same key into this one.
    fn absorb(&mut self, other: &Self) {
        if self.relationship_id == other.relationship_id
            || self.merged_relationship_ids.contains(&other.relationship_id)
        {
            return;
        }
        let total = round_quantity(self.quantity().unwrap_or(0.0) + other.quantity().unwrap_or(0.0));
        self.normalized_properties
            .insert("quantity".to_string(), NormValue::Number(total));

        let uom = merge_uom(self.value("uom"), other.value("uom"));
        if uom.is_null() {
            self.normalized_properties.remove("uom");
        } else {
            self.normalized_properties.insert("uom".to_string(), uom);
        }
        self.merged_relationship_ids.push(other.relationship_id.clone());
    }
}

fn merge_uom(left: &NormValue, right: &NormValue) -> NormValue {
    match (left, right) {
        (NormValue::Null, other) | (other, NormValue::Null) => other.clone(),
        (a, b) if a == b => a.clone(),
        _ => NormValue::Text(MIXED_UOM.to_string()),
    }
}

/// Settings for [`flatten`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlattenOptions {
    pub scheme: LineKeyScheme,
    /// Sum quantities of lines sharing a key instead of keeping the last
    pub aggregate: bool,
    pub include_child_fields: bool,
    pub include_substitutes: bool,
    pub include_effectivity: bool,
}

impl FlattenOptions {
    #[must_use]
    pub const fn new(scheme: LineKeyScheme) -> Self {
        Self {
            scheme,
            aggregate: false,
            include_child_fields: false,
            include_substitutes: false,
            include_effectivity: false,
        }
    }
}

/// Flatten every edge of `tree` into a `line_key -> entry` map.
///
/// The root id is replaced by [`ROOT_SENTINEL`] in keys. Lines colliding
/// on a key are summed when aggregating, otherwise the last one in
/// pre-order wins.
pub fn flatten(tree: &BomTree, options: &FlattenOptions) -> BTreeMap<String, FlattenedEdge> {
    let mut lines: BTreeMap<String, FlattenedEdge> = BTreeMap::new();
    let mut duplicates = 0usize;

    for visit in tree.edges() {
        let entry = flatten_edge(tree, &visit, options);
        match lines.get_mut(&entry.line_key) {
            Some(existing) if options.aggregate => existing.absorb(&entry),
            Some(existing) => {
                *existing = entry;
                duplicates += 1;
            }
            None => {
                lines.insert(entry.line_key.clone(), entry);
            }
        }
    }

    if duplicates > 0 {
        tracing::debug!(
            scheme = %options.scheme,
            duplicates,
            "lines sharing a key were dropped (last occurrence kept)"
        );
    }
    lines
}

fn flatten_edge(tree: &BomTree, visit: &EdgeVisit<'_>, options: &FlattenOptions) -> FlattenedEdge {
    let edge = &visit.edge.edge;
    let mut normalized = normalize(&edge.properties);

    if options.include_substitutes {
        let subs = match &visit.edge.substitutes {
            Some(subs) => normalize_substitutes(subs),
            None => match normalized.remove("substitutes") {
                Some(existing) if !existing.is_null() => existing,
                _ => normalize_substitutes(&[]),
            },
        };
        normalized.insert("substitutes".to_string(), subs);
    }
    if options.include_effectivity {
        let records = visit.edge.effectivities.as_deref().unwrap_or_default();
        normalized.insert("effectivities".to_string(), normalize_effectivities(records));
    }

    let parent_is_root = visit.level == 1;
    let parts = KeyParts {
        parent_id: if parent_is_root { ROOT_SENTINEL } else { &visit.parent.id },
        parent_config_id: if parent_is_root {
            Some(ROOT_SENTINEL)
        } else {
            visit.parent.config_id.as_deref()
        },
        child_id: &visit.child.id,
        child_config_id: visit.child.config_id.as_deref(),
        relationship_id: &edge.id,
    };

    FlattenedEdge {
        line_key: build_key(options.scheme, &parts, &normalized),
        base_key: base_key(options.scheme, &parts),
        parent_id: visit.parent.id.clone(),
        child_id: visit.child.id.clone(),
        relationship_id: edge.id.clone(),
        level: visit.level,
        path: tree.path(visit.index),
        raw_properties: edge.properties.clone(),
        normalized_properties: normalized,
        parent: options
            .include_child_fields
            .then(|| EdgeDescriptor::of(visit.parent)),
        child: options
            .include_child_fields
            .then(|| EdgeDescriptor::of(visit.child)),
        merged_relationship_ids: Vec::new(),
    }
}
