//! Diff result structures.

use super::flatten::FlattenedEdge;
use super::mode::{CompareMode, Severity};
use super::normalize::NormValue;
use serde::Serialize;

/// Complete result of a BOM comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[must_use]
pub struct DiffReport {
    pub mode: CompareMode,
    pub summary: DiffSummary,
    /// Lines only in the right-hand tree, sorted by line key
    pub added: Vec<FlattenedEdge>,
    /// Lines only in the left-hand tree, sorted by line key
    pub removed: Vec<FlattenedEdge>,
    /// Lines present on both sides with differing compared fields
    pub changed: Vec<ChangedEdge>,
}

impl DiffReport {
    pub fn new(mode: CompareMode) -> Self {
        Self {
            mode,
            summary: DiffSummary::default(),
            added: Vec::new(),
            removed: Vec::new(),
            changed: Vec::new(),
        }
    }

    /// Recompute counts from the entry lists, keeping `unchanged`.
    pub fn calculate_summary(&mut self) {
        self.summary.added = self.added.len();
        self.summary.removed = self.removed.len();
        self.summary.changed = self.changed.len();
        self.summary.changed_major = self.count_severity(Severity::Major);
        self.summary.changed_minor = self.count_severity(Severity::Minor);
        self.summary.changed_info = self.count_severity(Severity::Info);
    }

    fn count_severity(&self, severity: Severity) -> usize {
        self.changed.iter().filter(|c| c.severity == severity).count()
    }

    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty() || !self.changed.is_empty()
    }

    #[must_use]
    pub fn total_changes(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }
}

/// Summary statistics for a comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub changed: usize,
    pub changed_major: usize,
    pub changed_minor: usize,
    pub changed_info: usize,
    /// Only reported when unchanged lines were requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unchanged: Option<usize>,
}

/// A line present on both sides whose compared fields differ.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangedEdge {
    pub line_key: String,
    pub before: FlattenedEdge,
    pub after: FlattenedEdge,
    pub changes: Vec<FieldChange>,
    /// Highest severity across `changes`
    pub severity: Severity,
    /// `after - before` quantity, when both sides carry one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity_delta: Option<f64>,
}

/// Difference in one normalized field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub left: NormValue,
    pub right: NormValue,
    pub severity: Severity,
}

impl FieldChange {
    pub fn new(field: impl Into<String>, left: NormValue, right: NormValue) -> Self {
        let field = field.into();
        let severity = Severity::of_field(&field);
        Self {
            field,
            left,
            right,
            severity,
        }
    }
}
