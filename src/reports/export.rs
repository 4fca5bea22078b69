//! Flat tabular export of diff results.
//!
//! Every report becomes a list of [`ExportRow`]s with the columns
//! `op, line_key, parent_id, child_id, relationship_id, severity, field,
//! before, after`. Added and removed lines produce one row carrying the
//! line's properties as canonical JSON; changed lines produce one row per
//! changed field. The layout is for downstream reporting only.

use crate::diff::normalize::canonical_json;
use crate::diff::{ChangeOp, DeltaPreview, DiffReport, FlattenedEdge, NormalizedProperties};
use crate::error::{BomError, Result};
use serde::Serialize;
use serde_json::Value;

/// Column names, in output order
pub const EXPORT_COLUMNS: [&str; 9] = [
    "op",
    "line_key",
    "parent_id",
    "child_id",
    "relationship_id",
    "severity",
    "field",
    "before",
    "after",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub op: ChangeOp,
    pub line_key: String,
    pub parent_id: String,
    pub child_id: String,
    pub relationship_id: String,
    pub severity: String,
    pub field: String,
    pub before: String,
    pub after: String,
}

impl ExportRow {
    fn line(op: ChangeOp, line: &FlattenedEdge) -> Self {
        let properties = json_text(&Value::Object(line.raw_properties.clone()));
        let (before, after) = match op {
            ChangeOp::Remove => (properties, String::new()),
            _ => (String::new(), properties),
        };
        Self {
            op,
            line_key: line.line_key.clone(),
            parent_id: line.parent_id.clone(),
            child_id: line.child_id.clone(),
            relationship_id: line.relationship_id.clone(),
            severity: String::new(),
            field: String::new(),
            before,
            after,
        }
    }

    fn cells(&self) -> [&str; 9] {
        [
            self.op.as_str(),
            &self.line_key,
            &self.parent_id,
            &self.child_id,
            &self.relationship_id,
            &self.severity,
            &self.field,
            &self.before,
            &self.after,
        ]
    }
}

fn json_text(value: &Value) -> String {
    serde_json::to_string(&canonical_json(value)).unwrap_or_default()
}

fn normalized_text(properties: &NormalizedProperties) -> String {
    serde_json::to_string(properties).unwrap_or_default()
}

/// Rows for a diff: removed, then changed, then added.
pub fn export_rows(report: &DiffReport) -> Vec<ExportRow> {
    let mut rows = Vec::with_capacity(report.total_changes());
    rows.extend(report.removed.iter().map(|l| ExportRow::line(ChangeOp::Remove, l)));
    for changed in &report.changed {
        for change in &changed.changes {
            rows.push(ExportRow {
                op: ChangeOp::Update,
                line_key: changed.line_key.clone(),
                parent_id: changed.after.parent_id.clone(),
                child_id: changed.after.child_id.clone(),
                relationship_id: changed.after.relationship_id.clone(),
                severity: change.severity.to_string(),
                field: change.field.clone(),
                before: change.left.canonical(),
                after: change.right.canonical(),
            });
        }
    }
    rows.extend(report.added.iter().map(|l| ExportRow::line(ChangeOp::Add, l)));
    rows
}

/// Rows for a delta preview, in operation order.
pub fn delta_rows(preview: &DeltaPreview) -> Vec<ExportRow> {
    let mut rows = Vec::with_capacity(preview.operations.len());
    for op in &preview.operations {
        let base = ExportRow {
            op: op.op,
            line_key: op.line_key.clone(),
            parent_id: op.parent_id.clone(),
            child_id: op.child_id.clone(),
            relationship_id: op.relationship_id.clone(),
            severity: op.severity.map(|s| s.to_string()).unwrap_or_default(),
            field: String::new(),
            before: String::new(),
            after: String::new(),
        };
        match op.op {
            ChangeOp::Update => rows.extend(op.changes.iter().map(|c| ExportRow {
                field: c.field.clone(),
                before: c.before.canonical(),
                after: c.after.canonical(),
                ..base.clone()
            })),
            ChangeOp::Add => rows.push(ExportRow {
                after: op.properties.as_ref().map(normalized_text).unwrap_or_default(),
                ..base
            }),
            ChangeOp::Remove => rows.push(ExportRow {
                before: op.properties.as_ref().map(normalized_text).unwrap_or_default(),
                ..base
            }),
        }
    }
    rows
}

/// Parse a delimiter argument; exactly one character is accepted.
pub fn parse_delimiter(delimiter: &str) -> Result<char> {
    let mut chars = delimiter.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c != '"' && c != '\n' && c != '\r' => Ok(c),
        _ => Err(BomError::invalid(format!(
            "export delimiter must be a single character other than a quote or newline (got '{delimiter}')"
        ))),
    }
}

/// Quote a cell when it contains the delimiter, a quote or a line break.
fn escape_cell(cell: &str, delimiter: char) -> String {
    if cell.contains(delimiter) || cell.contains(['"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Render rows as delimited text with a header line.
pub fn rows_to_csv(rows: &[ExportRow], delimiter: &str) -> Result<String> {
    let delimiter = parse_delimiter(delimiter)?;
    let separator = delimiter.to_string();
    let mut out = String::new();
    out.push_str(&EXPORT_COLUMNS.join(&separator));
    out.push('\n');
    for row in rows {
        let cells: Vec<String> = row.cells().iter().map(|c| escape_cell(c, delimiter)).collect();
        out.push_str(&cells.join(&separator));
        out.push('\n');
    }
    Ok(out)
}

pub fn export_csv(report: &DiffReport, delimiter: &str) -> Result<String> {
    rows_to_csv(&export_rows(report), delimiter)
}

pub fn export_delta_csv(preview: &DeltaPreview, delimiter: &str) -> Result<String> {
    rows_to_csv(&delta_rows(preview), delimiter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{compare, CompareOptions};
    use crate::model::{BomTree, Edge, Node, TreeEdge};

    fn tree(find: &str, extra: Option<&str>) -> BomTree {
        let mut tree = BomTree::new(Node::new("A"));
        let root = tree.root();
        tree.push_child(
            root,
            TreeEdge::plain(Edge::new("r1", "A", "X").with_quantity(1).with_property("find_num", find)),
            Node::new("X"),
        );
        if let Some(child) = extra {
            tree.push_child(
                root,
                TreeEdge::plain(Edge::new("r2", "A", child).with_property("note", "a, \"b\"")),
                Node::new(child),
            );
        }
        tree
    }

    #[test]
    fn test_delimiter_must_be_single_char() {
        assert_eq!(parse_delimiter(";").unwrap(), ';');
        assert_eq!(parse_delimiter("\t").unwrap(), '\t');
        assert!(parse_delimiter("").unwrap_err().is_invalid_argument());
        assert!(parse_delimiter(",,").unwrap_err().is_invalid_argument());
        assert!(parse_delimiter("\"").unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_rows_per_changed_field() {
        let report = compare(&tree("10", None), &tree("20", Some("Y")), "by_position", &CompareOptions::default()).unwrap();
        let rows = export_rows(&report);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].op, ChangeOp::Update);
        assert_eq!(rows[0].field, "find_num");
        assert_eq!((rows[0].before.as_str(), rows[0].after.as_str()), ("10", "20"));
        assert_eq!(rows[0].severity, "minor");
        assert_eq!(rows[1].op, ChangeOp::Add);
        assert_eq!(rows[1].after, r#"{"note":"a, \"b\""}"#);
    }

    #[test]
    fn test_csv_quoting() {
        let report = compare(&tree("10", None), &tree("10", Some("Y")), "by_position", &CompareOptions::default()).unwrap();
        let csv = export_csv(&report, ",").unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "op,line_key,parent_id,child_id,relationship_id,severity,field,before,after");
        assert_eq!(lines[1], r#"add,ROOT::Y::,A,Y,r2,,,,"{""note"":""a, \""b\""""}""#);

        let semicolon = export_csv(&report, ";").unwrap();
        assert!(semicolon.starts_with("op;line_key;"));
    }
}
