//! In-memory graph store, loadable from a JSON or YAML document.

use super::{EffectivityOracle, GraphStore, SubstituteProvider};
use crate::bom::VariantRule;
use crate::effectivity::{parse_timestamp, Effectivity};
use crate::error::{BomError, ErrorContext, Result};
use crate::model::{Edge, Node, Substitute};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Serialized form of a store snapshot.
///
/// ```yaml
/// nodes:
///   - { id: A, config_id: CFG-A, properties: { item_number: "100-A" } }
///   - { id: B }
/// edges:
///   - { id: r1, source_id: A, related_id: B, properties: { quantity: 2, uom: EA } }
/// effectivities:
///   - { item_id: r1, effectivity_type: Date, start_date: "2024-01-01" }
/// substitutes:
///   r1: [ { item_id: B2, rank: 1 } ]
/// variant_rules:
///   - { name: no-b, parent_item_id: A, condition: "Trim=base", action_type: exclude, target_item_id: B }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreDocument {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub effectivities: Vec<Effectivity>,
    pub substitutes: IndexMap<String, Vec<Substitute>>,
    pub variant_rules: Vec<VariantRule>,
}

/// A point-in-time store snapshot held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraphStore {
    nodes: HashMap<String, Node>,
    edges: Vec<Edge>,
    edge_index: HashMap<String, usize>,
    outgoing: HashMap<String, Vec<usize>>,
    incoming: HashMap<String, Vec<usize>>,
    effectivities: HashMap<String, Vec<Effectivity>>,
    substitutes: HashMap<String, Vec<Substitute>>,
    variant_rules: Vec<VariantRule>,
}

impl InMemoryGraphStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a node.
    pub fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Insert an edge. An edge with an id already present replaces it.
    pub fn insert_edge(&mut self, edge: Edge) {
        if let Some(&slot) = self.edge_index.get(&edge.id) {
            let old = std::mem::replace(&mut self.edges[slot], edge);
            remove_slot(&mut self.outgoing, &old.source_id, slot);
            remove_slot(&mut self.incoming, &old.related_id, slot);
            let edge = &self.edges[slot];
            self.outgoing.entry(edge.source_id.clone()).or_default().push(slot);
            self.incoming.entry(edge.related_id.clone()).or_default().push(slot);
            return;
        }
        let slot = self.edges.len();
        self.edge_index.insert(edge.id.clone(), slot);
        self.outgoing.entry(edge.source_id.clone()).or_default().push(slot);
        self.incoming.entry(edge.related_id.clone()).or_default().push(slot);
        self.edges.push(edge);
    }

    pub fn add_effectivity(&mut self, record: Effectivity) {
        self.effectivities
            .entry(record.item_id.clone())
            .or_default()
            .push(record);
    }

    pub fn add_substitute(&mut self, edge_id: impl Into<String>, substitute: Substitute) {
        self.substitutes
            .entry(edge_id.into())
            .or_default()
            .push(substitute);
    }

    pub fn add_variant_rule(&mut self, rule: VariantRule) {
        self.variant_rules.push(rule);
    }

    #[must_use]
    pub fn with_node(mut self, node: Node) -> Self {
        self.insert_node(node);
        self
    }

    #[must_use]
    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.insert_edge(edge);
        self
    }

    #[must_use]
    pub fn with_effectivity(mut self, record: Effectivity) -> Self {
        self.add_effectivity(record);
        self
    }

    #[must_use]
    pub fn with_variant_rule(mut self, rule: VariantRule) -> Self {
        self.add_variant_rule(rule);
        self
    }

    /// Variant rules in document order, active or not
    pub fn variant_rules(&self) -> &[VariantRule] {
        &self.variant_rules
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Look up an edge by relationship id, current or not.
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edge_index.get(id).map(|&slot| &self.edges[slot])
    }

    pub fn from_document(document: StoreDocument) -> Self {
        let mut store = Self::new();
        for node in document.nodes {
            store.insert_node(node);
        }
        for edge in document.edges {
            store.insert_edge(edge);
        }
        for record in document.effectivities {
            store.add_effectivity(record);
        }
        for (edge_id, subs) in document.substitutes {
            store.substitutes.entry(edge_id).or_default().extend(subs);
        }
        store.variant_rules = document.variant_rules;
        store
    }

    /// Snapshot back to document form. Nodes are sorted by id.
    pub fn to_document(&self) -> StoreDocument {
        let mut nodes: Vec<Node> = self.nodes.values().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        let mut effectivities: Vec<Effectivity> =
            self.effectivities.values().flatten().cloned().collect();
        effectivities.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        let mut substitutes: IndexMap<String, Vec<Substitute>> = self
            .substitutes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        substitutes.sort_keys();
        StoreDocument {
            nodes,
            edges: self.edges.clone(),
            effectivities,
            substitutes,
            variant_rules: self.variant_rules.clone(),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let document: StoreDocument = serde_json::from_str(content)?;
        Ok(Self::from_document(document))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let document: StoreDocument = serde_yaml::from_str(content)?;
        Ok(Self::from_document(document))
    }

    /// Load a store document; `.yaml`/`.yml` files are read as YAML,
    /// everything else as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BomError::io(path, e))?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
        let store = if is_yaml {
            Self::from_yaml_str(&content)
        } else {
            Self::from_json_str(&content)
        };
        store.with_context(|| format!("loading store {}", path.display()))
    }

    fn current_edges(&self, slots: Option<&Vec<usize>>) -> Vec<Edge> {
        slots
            .into_iter()
            .flatten()
            .map(|&slot| &self.edges[slot])
            .filter(|edge| edge.is_current)
            .cloned()
            .collect()
    }
}

fn remove_slot(index: &mut HashMap<String, Vec<usize>>, key: &str, slot: usize) {
    if let Some(slots) = index.get_mut(key) {
        slots.retain(|&s| s != slot);
    }
}

impl GraphStore for InMemoryGraphStore {
    fn get_node(&self, id: &str) -> Result<Option<Node>> {
        Ok(self.nodes.get(id).cloned())
    }

    fn get_outgoing_edges(&self, source_id: &str) -> Result<Vec<Edge>> {
        let mut edges = self.current_edges(self.outgoing.get(source_id));
        sort_by_slot(&mut edges, &self.edge_index);
        Ok(edges)
    }

    fn get_incoming_edges(&self, related_id: &str) -> Result<Vec<Edge>> {
        let mut edges = self.current_edges(self.incoming.get(related_id));
        sort_by_slot(&mut edges, &self.edge_index);
        Ok(edges)
    }
}

/// Keep stored order after replacements shuffled the slot lists.
fn sort_by_slot(edges: &mut [Edge], index: &HashMap<String, usize>) {
    edges.sort_by_key(|e| index.get(&e.id).copied().unwrap_or(usize::MAX));
}

impl EffectivityOracle for InMemoryGraphStore {
    /// Explicit records first; an edge without records but with
    /// `effectivity_from`/`effectivity_to` properties carries one Date
    /// record over that window.
    fn effectivities(&self, edge_id: &str) -> Result<Vec<Effectivity>> {
        if let Some(records) = self.effectivities.get(edge_id).filter(|r| !r.is_empty()) {
            return Ok(records.clone());
        }
        Ok(self
            .edge(edge_id)
            .and_then(derived_date_window)
            .into_iter()
            .collect())
    }
}

fn derived_date_window(edge: &Edge) -> Option<Effectivity> {
    let bound = |key: &str| {
        edge.properties
            .get(key)
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
    };
    let start = bound("effectivity_from");
    let end = bound("effectivity_to");
    if start.is_none() && end.is_none() {
        return None;
    }
    Some(Effectivity::date(edge.id.clone(), start, end))
}

impl SubstituteProvider for InMemoryGraphStore {
    /// Explicit table entries first, then the edge's `substitutes` property
    /// (a list of item ids or `{item_id, rank, note}` objects).
    fn get_substitutes(&self, edge_id: &str) -> Result<Vec<Substitute>> {
        if let Some(subs) = self.substitutes.get(edge_id).filter(|s| !s.is_empty()) {
            return Ok(subs.clone());
        }
        let Some(Value::Array(items)) = self
            .edge(edge_id)
            .and_then(|edge| edge.properties.get("substitutes"))
        else {
            return Ok(Vec::new());
        };
        let mut subs = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::String(id) => subs.push(Substitute::new(id.clone())),
                other => subs.push(
                    serde_json::from_value(other.clone())
                        .context(format!("substitutes of edge {edge_id}"))?,
                ),
            }
        }
        Ok(subs)
    }
}
