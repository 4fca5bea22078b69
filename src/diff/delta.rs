//! Patch-style preview of a diff.

use super::mode::Severity;
use super::normalize::{NormValue, NormalizedProperties};
use super::result::DiffReport;
use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

/// Kind of a line-level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Add,
    Remove,
    Update,
}

impl ChangeOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeltaSummary {
    pub total_ops: usize,
    pub adds: usize,
    pub removes: usize,
    pub updates: usize,
}

/// One field of an `update` operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaChange {
    pub field: String,
    pub before: NormValue,
    pub after: NormValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaOp {
    /// Stable id derived from the op kind and line key
    pub op_id: String,
    pub op: ChangeOp,
    pub line_key: String,
    pub parent_id: String,
    pub child_id: String,
    pub relationship_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<DeltaChange>,
    /// Normalized line properties for `add` (after) and `remove` (before)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<NormalizedProperties>,
}

impl DeltaOp {
    fn new(op: ChangeOp, line_key: &str, parent_id: &str, child_id: &str, relationship_id: &str) -> Self {
        Self {
            op_id: op_id(op, line_key),
            op,
            line_key: line_key.to_string(),
            parent_id: parent_id.to_string(),
            child_id: child_id.to_string(),
            relationship_id: relationship_id.to_string(),
            severity: None,
            changes: Vec::new(),
            properties: None,
        }
    }
}

fn op_id(op: ChangeOp, line_key: &str) -> String {
    format!("{:016x}", xxh3_64(format!("{op}:{line_key}").as_bytes()))
}

/// Operations that turn the left-hand BOM into the right-hand one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeltaPreview {
    pub summary: DeltaSummary,
    pub operations: Vec<DeltaOp>,
}

impl DeltaPreview {
    /// Removes first, then updates, then adds; each group in line key order.
    pub fn from_report(report: &DiffReport) -> Self {
        let mut operations = Vec::with_capacity(report.total_changes());

        for line in &report.removed {
            let mut op = DeltaOp::new(
                ChangeOp::Remove,
                &line.line_key,
                &line.parent_id,
                &line.child_id,
                &line.relationship_id,
            );
            op.properties = Some(line.normalized_properties.clone());
            operations.push(op);
        }
        for changed in &report.changed {
            let mut op = DeltaOp::new(
                ChangeOp::Update,
                &changed.line_key,
                &changed.after.parent_id,
                &changed.after.child_id,
                &changed.after.relationship_id,
            );
            op.severity = Some(changed.severity);
            op.changes = changed
                .changes
                .iter()
                .map(|c| DeltaChange {
                    field: c.field.clone(),
                    before: c.left.clone(),
                    after: c.right.clone(),
                })
                .collect();
            operations.push(op);
        }
        for line in &report.added {
            let mut op = DeltaOp::new(
                ChangeOp::Add,
                &line.line_key,
                &line.parent_id,
                &line.child_id,
                &line.relationship_id,
            );
            op.properties = Some(line.normalized_properties.clone());
            operations.push(op);
        }

        let summary = DeltaSummary {
            total_ops: operations.len(),
            adds: report.added.len(),
            removes: report.removed.len(),
            updates: report.changed.len(),
        };
        Self {
            summary,
            operations,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{compare, CompareOptions};
    use crate::model::{BomTree, Edge, Node, TreeEdge};

    fn tree(lines: &[(&str, &str, i64)]) -> BomTree {
        let mut tree = BomTree::new(Node::new("A"));
        let root = tree.root();
        for (rel, child, qty) in lines {
            tree.push_child(
                root,
                TreeEdge::plain(Edge::new(*rel, "A", *child).with_quantity(*qty)),
                Node::new(*child),
            );
        }
        tree
    }

    #[test]
    fn test_preview_orders_and_counts() {
        let a = tree(&[("r1", "X", 1), ("r2", "Y", 1)]);
        let b = tree(&[("r1", "X", 3), ("r3", "Z", 1)]);
        let report = compare(&a, &b, "summarized", &CompareOptions::default()).unwrap();
        let preview = DeltaPreview::from_report(&report);

        let ops: Vec<_> = preview.operations.iter().map(|o| (o.op, o.child_id.as_str())).collect();
        assert_eq!(
            ops,
            vec![(ChangeOp::Remove, "Y"), (ChangeOp::Update, "X"), (ChangeOp::Add, "Z")]
        );
        assert_eq!(
            preview.summary,
            DeltaSummary {
                total_ops: 3,
                adds: 1,
                removes: 1,
                updates: 1
            }
        );
        let update = &preview.operations[1];
        assert_eq!(update.changes[0].field, "quantity");
        assert_eq!(update.changes[0].before, NormValue::Number(1.0));
        assert_eq!(update.changes[0].after, NormValue::Number(3.0));
    }

    #[test]
    fn test_op_ids_are_stable() {
        assert_eq!(op_id(ChangeOp::Add, "ROOT::X"), op_id(ChangeOp::Add, "ROOT::X"));
        assert_ne!(op_id(ChangeOp::Add, "ROOT::X"), op_id(ChangeOp::Remove, "ROOT::X"));
        assert_eq!(op_id(ChangeOp::Add, "ROOT::X").len(), 16);
    }

    #[test]
    fn test_empty_report() {
        let a = tree(&[("r1", "X", 1)]);
        let report = compare(&a, &a, "by_position", &CompareOptions::default()).unwrap();
        assert!(DeltaPreview::from_report(&report).is_empty());
    }
}
