//! Reverse lookup: which assemblies use an item.

use crate::error::{ErrorContext, Result};
use crate::model::{Edge, Node};
use crate::store::GraphStore;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// One parent usage of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereUsedEntry {
    pub relationship: Edge,
    pub parent: Node,
    /// 1 for direct parents, 2 for grandparents, ...
    pub level: usize,
}

/// Find the current parents of `item_id`.
///
/// With `recursive`, ancestors are walked breadth-first up to `max_levels`
/// (`None` for no limit). Each ancestor is expanded once, so cyclic data
/// terminates; every usage edge is reported once.
pub fn where_used(
    store: &dyn GraphStore,
    item_id: &str,
    recursive: bool,
    max_levels: Option<usize>,
) -> Result<Vec<WhereUsedEntry>> {
    let max_levels = if recursive { max_levels } else { Some(1) };
    let mut entries = Vec::new();
    let mut expanded: HashSet<String> = HashSet::from([item_id.to_string()]);
    let mut queue: VecDeque<(String, usize)> = VecDeque::from([(item_id.to_string(), 1)]);

    while let Some((current, level)) = queue.pop_front() {
        if max_levels.is_some_and(|max| level > max) {
            continue;
        }
        let incoming = store
            .get_incoming_edges(&current)
            .with_context(|| format!("where-used of {current}"))?;
        for edge in incoming {
            let Some(parent) = store.get_node(&edge.source_id)?.filter(|n| n.is_current) else {
                continue;
            };
            if expanded.insert(parent.id.clone()) {
                queue.push_back((parent.id.clone(), level + 1));
            }
            entries.push(WhereUsedEntry {
                relationship: edge,
                parent,
                level,
            });
        }
    }

    tracing::debug!(item_id, usages = entries.len(), "where-used lookup");
    Ok(entries)
}
