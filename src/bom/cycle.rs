//! Write-path cycle detection.

use crate::error::{BomError, Result};
use crate::store::GraphStore;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Outcome of a cycle check for a proposed `parent -> child` edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleResult {
    pub has_cycle: bool,
    /// `[parent, child, .., parent]` witness when a cycle exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
}

impl CycleResult {
    const fn acyclic() -> Self {
        Self {
            has_cycle: false,
            path: None,
        }
    }

    fn cycle(path: Vec<String>) -> Self {
        Self {
            has_cycle: true,
            path: Some(path),
        }
    }

    /// Convert a detected cycle into [`BomError::CycleDetected`].
    pub fn into_result(self) -> Result<()> {
        match self.path {
            Some(path) if self.has_cycle => {
                let parent_id = path.first().cloned().unwrap_or_default();
                let child_id = path.get(1).cloned().unwrap_or_default();
                Err(BomError::CycleDetected {
                    parent_id,
                    child_id,
                    path,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Checks whether a proposed edge would close a cycle in the stored graph.
pub struct CycleDetector<'a> {
    store: &'a dyn GraphStore,
}

impl<'a> CycleDetector<'a> {
    pub fn new(store: &'a dyn GraphStore) -> Self {
        Self { store }
    }

    /// Breadth-first search from `child_id` along outgoing edges, looking
    /// for `parent_id`. The first path found is returned as the witness.
    ///
    /// `parent_id == child_id` is always a cycle.
    pub fn would_create_cycle(&self, parent_id: &str, child_id: &str) -> Result<CycleResult> {
        if parent_id == child_id {
            return Ok(CycleResult::cycle(vec![
                parent_id.to_string(),
                child_id.to_string(),
            ]));
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, Vec<String>)> = VecDeque::new();
        queue.push_back((
            child_id.to_string(),
            vec![parent_id.to_string(), child_id.to_string()],
        ));

        while let Some((current, path)) = queue.pop_front() {
            if current == parent_id {
                tracing::debug!(parent_id, child_id, length = path.len(), "cycle detected");
                return Ok(CycleResult::cycle(path));
            }
            if !visited.insert(current.clone()) {
                continue;
            }
            for edge in self.store.get_outgoing_edges(&current)? {
                let next = edge.related_id;
                if next.is_empty() || visited.contains(&next) {
                    continue;
                }
                let mut extended = path.clone();
                extended.push(next.clone());
                queue.push_back((next, extended));
            }
        }

        Ok(CycleResult::acyclic())
    }
}

/// Whether adding `parent_id -> child_id` would create a cycle.
pub fn detect_cycle(store: &dyn GraphStore, parent_id: &str, child_id: &str) -> Result<CycleResult> {
    CycleDetector::new(store).would_create_cycle(parent_id, child_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, Node};
    use crate::store::InMemoryGraphStore;

    fn store() -> InMemoryGraphStore {
        // A -> B -> C -> D, A -> D
        ["A", "B", "C", "D"]
            .into_iter()
            .fold(InMemoryGraphStore::new(), |s, id| s.with_node(Node::new(id)))
            .with_edge(Edge::new("r1", "A", "B"))
            .with_edge(Edge::new("r2", "B", "C"))
            .with_edge(Edge::new("r3", "C", "D"))
            .with_edge(Edge::new("r4", "A", "D"))
    }

    #[test]
    fn test_self_cycle() {
        let result = detect_cycle(&store(), "X", "X").unwrap();
        assert!(result.has_cycle);
        assert_eq!(result.path.unwrap(), vec!["X", "X"]);
    }

    #[test]
    fn test_acyclic_proposal() {
        let result = detect_cycle(&store(), "A", "C").unwrap();
        assert_eq!(result, CycleResult::acyclic());
        assert!(result.into_result().is_ok());
    }

    #[test]
    fn test_cycle_path_witness() {
        let result = detect_cycle(&store(), "D", "A").unwrap();
        assert!(result.has_cycle);
        // BFS finds the shorter route A -> D first
        assert_eq!(result.path.clone().unwrap(), vec!["D", "A", "D"]);

        let err = result.into_result().unwrap_err();
        match err {
            BomError::CycleDetected {
                parent_id,
                child_id,
                path,
            } => {
                assert_eq!(parent_id, "D");
                assert_eq!(child_id, "A");
                assert_eq!(path.len(), 3);
            }
            other => panic!("expected CycleDetected, got {other:?}"),
        }
    }

    #[test]
    fn test_longer_path() {
        let result = detect_cycle(&store(), "C", "A").unwrap();
        assert_eq!(result.path.unwrap(), vec!["C", "A", "B", "C"]);
    }
}
