//! Collaborator contracts consumed by the BOM engine.
//!
//! The engine never owns persistent state: it reads nodes and edges from a
//! [`GraphStore`] snapshot, asks an [`EffectivityOracle`] whether an edge is
//! active, and, when requested, asks a [`SubstituteProvider`] for alternates.
//! Implementations decide their own timeout and retry policy; failures come
//! back as [`BomError::Store`](crate::BomError::Store) and are propagated as is.

mod memory;

pub use memory::{InMemoryGraphStore, StoreDocument};

use crate::effectivity::{any_effective, Effectivity, EffectivityContext};
use crate::error::Result;
use crate::model::{Edge, Node, Substitute};

/// Read access to items and relationship items.
pub trait GraphStore: Send + Sync {
    /// Look up a node by id.
    fn get_node(&self, id: &str) -> Result<Option<Node>>;

    /// Current edges whose `source_id` is `source_id`, in stored order.
    fn get_outgoing_edges(&self, source_id: &str) -> Result<Vec<Edge>>;

    /// Current edges whose `related_id` is `related_id`, in stored order.
    fn get_incoming_edges(&self, related_id: &str) -> Result<Vec<Edge>>;
}

/// Source of effectivity records for relationship items.
pub trait EffectivityOracle: Send + Sync {
    /// Records attached to an edge. An edge without records is always effective.
    fn effectivities(&self, edge_id: &str) -> Result<Vec<Effectivity>>;

    /// Whether the edge is active in `ctx`.
    ///
    /// An empty context, or an edge without records, is always effective;
    /// otherwise any matching record suffices.
    fn is_effective(&self, edge_id: &str, ctx: &EffectivityContext) -> Result<bool> {
        if ctx.is_empty() {
            return Ok(true);
        }
        Ok(any_effective(&self.effectivities(edge_id)?, ctx))
    }
}

/// Source of alternate items for a BOM line.
pub trait SubstituteProvider: Send + Sync {
    fn get_substitutes(&self, edge_id: &str) -> Result<Vec<Substitute>>;
}
