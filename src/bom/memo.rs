//! Lookup memo scoped to one traversal call.

use crate::effectivity::{Effectivity, EffectivityContext};
use crate::error::Result;
use crate::model::{Node, Substitute};
use crate::store::{EffectivityOracle, GraphStore, SubstituteProvider};
use std::collections::HashMap;

/// Caches collaborator answers for the lifetime of one build, so shared
/// sub-assemblies and repeated lines hit the store once.
#[derive(Debug, Default)]
pub(crate) struct TraversalMemo {
    nodes: HashMap<String, Option<Node>>,
    effective: HashMap<String, bool>,
    records: HashMap<String, Vec<Effectivity>>,
    substitutes: HashMap<String, Vec<Substitute>>,
    pub hits: usize,
}

impl TraversalMemo {
    pub(crate) fn node(&mut self, store: &dyn GraphStore, id: &str) -> Result<Option<Node>> {
        if let Some(cached) = self.nodes.get(id) {
            self.hits += 1;
            return Ok(cached.clone());
        }
        let node = store.get_node(id)?;
        self.nodes.insert(id.to_string(), node.clone());
        Ok(node)
    }

    pub(crate) fn is_effective(
        &mut self,
        oracle: &dyn EffectivityOracle,
        edge_id: &str,
        ctx: &EffectivityContext,
    ) -> Result<bool> {
        if let Some(&cached) = self.effective.get(edge_id) {
            self.hits += 1;
            return Ok(cached);
        }
        let effective = oracle.is_effective(edge_id, ctx)?;
        self.effective.insert(edge_id.to_string(), effective);
        Ok(effective)
    }

    pub(crate) fn effectivities(
        &mut self,
        oracle: &dyn EffectivityOracle,
        edge_id: &str,
    ) -> Result<Vec<Effectivity>> {
        if let Some(cached) = self.records.get(edge_id) {
            self.hits += 1;
            return Ok(cached.clone());
        }
        let records = oracle.effectivities(edge_id)?;
        self.records.insert(edge_id.to_string(), records.clone());
        Ok(records)
    }

    pub(crate) fn substitutes(
        &mut self,
        provider: &dyn SubstituteProvider,
        edge_id: &str,
    ) -> Result<Vec<Substitute>> {
        if let Some(cached) = self.substitutes.get(edge_id) {
            self.hits += 1;
            return Ok(cached.clone());
        }
        let subs = provider.get_substitutes(edge_id)?;
        self.substitutes.insert(edge_id.to_string(), subs.clone());
        Ok(subs)
    }
}
