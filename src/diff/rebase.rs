//! Level-1 change sets and rebase conflict detection for change orders.
//!
//! Both work on the direct children of the root only, keyed by raw child
//! item id, and compare raw relationship properties. A child used through
//! several level-1 relationships is represented by the last one.

use super::delta::ChangeOp;
use crate::model::{BomTree, Properties};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Reason attached to every rebase conflict
pub const CONCURRENT_MODIFICATION: &str = "concurrent_modification_different_values";

/// Two sides changed the same level-1 line to different values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    pub child_item_id: String,
    /// `None` when the line is absent on that side
    pub base_value: Option<Properties>,
    pub my_value: Option<Properties>,
    pub their_value: Option<Properties>,
    pub reason: &'static str,
}

/// One level-1 difference between two trees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Level1Change {
    pub op: ChangeOp,
    pub child_item_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Properties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Properties>,
}

/// Level-1 lines of `tree`: child id -> relationship properties.
///
/// A later relationship to the same child replaces an earlier one.
pub fn level1_lines(tree: &BomTree) -> BTreeMap<String, Properties> {
    tree.children(tree.root())
        .map(|(via, child)| (tree.node(child).id.clone(), via.edge.properties.clone()))
        .collect()
}

/// Classify every level-1 child as added, removed or updated, by child id.
pub fn level1_changes(base: &BomTree, target: &BomTree) -> Vec<Level1Change> {
    let before = level1_lines(base);
    let after = level1_lines(target);
    let ids: BTreeSet<&String> = before.keys().chain(after.keys()).collect();

    ids.into_iter()
        .filter_map(|id| {
            let old = before.get(id);
            let new = after.get(id);
            let op = match (old, new) {
                (None, Some(_)) => ChangeOp::Add,
                (Some(_), None) => ChangeOp::Remove,
                (Some(o), Some(n)) if o != n => ChangeOp::Update,
                _ => return None,
            };
            Some(Level1Change {
                op,
                child_item_id: id.clone(),
                before: old.cloned(),
                after: new.cloned(),
            })
        })
        .collect()
}

/// Whether a change order started from `source` must be rebased onto
/// `current` before it can be applied.
#[must_use]
pub fn needs_rebase(source: &BomTree, current: &BomTree) -> bool {
    source != current
}

/// Report level-1 lines that both `mine` and `theirs` changed relative to
/// `base`, to different values. Sorted by child id.
pub fn detect_rebase_conflicts(base: &BomTree, mine: &BomTree, theirs: &BomTree) -> Vec<Conflict> {
    let base = level1_lines(base);
    let mine = level1_lines(mine);
    let theirs = level1_lines(theirs);
    let ids: BTreeSet<&String> = base.keys().chain(mine.keys()).chain(theirs.keys()).collect();

    let conflicts: Vec<Conflict> = ids
        .into_iter()
        .filter_map(|id| {
            let b = base.get(id);
            let m = mine.get(id);
            let t = theirs.get(id);
            let my_changed = b != m;
            let their_changed = b != t;
            (my_changed && their_changed && m != t).then(|| Conflict {
                child_item_id: id.clone(),
                base_value: b.cloned(),
                my_value: m.cloned(),
                their_value: t.cloned(),
                reason: CONCURRENT_MODIFICATION,
            })
        })
        .collect();

    tracing::debug!(conflicts = conflicts.len(), "rebase conflict check complete");
    conflicts
}
