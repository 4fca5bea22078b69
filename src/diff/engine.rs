//! Structural BOM comparison.

use super::flatten::{flatten, FlattenOptions, FlattenedEdge};
use super::mode::{CompareMode, LineKeyScheme, Severity};
use super::normalize::round_quantity;
use super::result::{ChangedEdge, DiffReport, FieldChange};
use crate::error::{BomError, Result};
use crate::model::BomTree;
use std::collections::{BTreeMap, BTreeSet};

/// Default tolerance for numeric field comparison
pub const DEFAULT_QUANTITY_TOLERANCE: f64 = 1e-6;

/// Options for [`DiffEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompareOptions {
    pub mode: CompareMode,
    /// Replaces the mode's line key scheme
    pub line_key: Option<LineKeyScheme>,
    /// Attach parent/child descriptors to every line
    pub include_child_fields: bool,
    /// Replaces the mode's compared relationship properties
    pub include_relationship_props: Option<Vec<String>>,
    pub include_substitutes: bool,
    pub include_effectivity: bool,
    /// Report the number of unchanged lines in the summary
    pub include_unchanged: bool,
    pub quantity_tolerance: f64,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self::new(CompareMode::default())
    }
}

impl CompareOptions {
    #[must_use]
    pub const fn new(mode: CompareMode) -> Self {
        Self {
            mode,
            line_key: None,
            include_child_fields: false,
            include_relationship_props: None,
            include_substitutes: false,
            include_effectivity: false,
            include_unchanged: false,
            quantity_tolerance: DEFAULT_QUANTITY_TOLERANCE,
        }
    }

    #[must_use]
    pub const fn with_line_key(mut self, scheme: LineKeyScheme) -> Self {
        self.line_key = Some(scheme);
        self
    }

    #[must_use]
    pub fn with_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_relationship_props = Some(properties.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub const fn include_child_fields(mut self, include: bool) -> Self {
        self.include_child_fields = include;
        self
    }

    #[must_use]
    pub const fn include_substitutes(mut self, include: bool) -> Self {
        self.include_substitutes = include;
        self
    }

    #[must_use]
    pub const fn include_effectivity(mut self, include: bool) -> Self {
        self.include_effectivity = include;
        self
    }

    #[must_use]
    pub const fn include_unchanged(mut self, include: bool) -> Self {
        self.include_unchanged = include;
        self
    }

    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.quantity_tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn scheme(&self) -> LineKeyScheme {
        self.line_key.unwrap_or_else(|| self.mode.key_scheme())
    }

    /// Fields compared on matched lines, sorted. Always empty for
    /// `only_product`.
    #[must_use]
    pub fn compared_properties(&self) -> Vec<String> {
        if !self.mode.compares_attributes() {
            return Vec::new();
        }
        let mut fields: BTreeSet<String> = match &self.include_relationship_props {
            Some(props) => props.iter().map(|p| p.trim().to_string()).collect(),
            None => self
                .mode
                .default_properties()
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
        };
        if self.include_substitutes {
            fields.insert("substitutes".to_string());
        }
        if self.include_effectivity {
            fields.insert("effectivities".to_string());
        }
        fields.remove("");
        fields.into_iter().collect()
    }

    fn flatten_options(&self) -> FlattenOptions {
        FlattenOptions {
            scheme: self.scheme(),
            aggregate: self.mode.aggregates(),
            include_child_fields: self.include_child_fields,
            include_substitutes: self.include_substitutes,
            include_effectivity: self.include_effectivity,
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.quantity_tolerance.is_finite() || self.quantity_tolerance < 0.0 {
            return Err(BomError::invalid(format!(
                "quantity tolerance must be a non-negative number, got {}",
                self.quantity_tolerance
            )));
        }
        Ok(())
    }
}

/// Compares two BOM trees line by line.
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    options: CompareOptions,
}

impl DiffEngine {
    #[must_use]
    pub const fn new(options: CompareOptions) -> Self {
        Self { options }
    }

    pub const fn options(&self) -> &CompareOptions {
        &self.options
    }

    /// Compare `left` (before) against `right` (after).
    ///
    /// Lines are matched on their exact key first. Lines left over on both
    /// sides that share the same parent and child are then paired in key
    /// order and reported as changed, so a moved find number or a
    /// re-designated line shows up as an attribute change rather than a
    /// remove plus an add.
    pub fn compare(&self, left: &BomTree, right: &BomTree) -> Result<DiffReport> {
        self.options.validate()?;
        let flatten_options = self.options.flatten_options();
        let fields = self.options.compared_properties();

        let mut left_lines = flatten(left, &flatten_options);
        let mut right_lines = flatten(right, &flatten_options);

        let mut report = DiffReport::new(self.options.mode);
        let mut unchanged = 0usize;

        let common: Vec<String> = left_lines
            .keys()
            .filter(|k| right_lines.contains_key(*k))
            .cloned()
            .collect();
        for key in common {
            let (Some(before), Some(after)) = (left_lines.remove(&key), right_lines.remove(&key))
            else {
                continue;
            };
            match self.changed_edge(key, before, after, &fields) {
                Some(changed) => report.changed.push(changed),
                None => unchanged += 1,
            }
        }

        for (before, after) in pair_leftovers(&mut left_lines, &mut right_lines) {
            let key = before.line_key.clone();
            match self.changed_edge(key, before, after, &fields) {
                Some(changed) => report.changed.push(changed),
                None => unchanged += 1,
            }
        }

        report.removed = left_lines.into_values().collect();
        report.added = right_lines.into_values().collect();
        report.changed.sort_by(|a, b| a.line_key.cmp(&b.line_key));
        report.calculate_summary();
        if self.options.include_unchanged {
            report.summary.unchanged = Some(unchanged);
        }

        tracing::debug!(
            mode = %self.options.mode,
            scheme = %self.options.scheme(),
            added = report.summary.added,
            removed = report.summary.removed,
            changed = report.summary.changed,
            unchanged,
            "BOM comparison complete"
        );
        Ok(report)
    }

    fn changed_edge(
        &self,
        line_key: String,
        before: FlattenedEdge,
        after: FlattenedEdge,
        fields: &[String],
    ) -> Option<ChangedEdge> {
        let tolerance = self.options.quantity_tolerance;
        let changes: Vec<FieldChange> = fields
            .iter()
            .filter_map(|field| {
                let left = before.value(field);
                let right = after.value(field);
                (!left.equivalent(right, tolerance))
                    .then(|| FieldChange::new(field.clone(), left.clone(), right.clone()))
            })
            .collect();
        let severity = changes.iter().map(|c| c.severity).max()?;
        let quantity_delta = match (before.quantity(), after.quantity()) {
            (Some(l), Some(r)) => Some(round_quantity(r - l)),
            _ => None,
        };
        Some(ChangedEdge {
            line_key,
            before,
            after,
            changes,
            severity,
            quantity_delta,
        })
    }
}

/// Remove and pair unmatched lines that share a base key, in key order.
fn pair_leftovers(
    left: &mut BTreeMap<String, FlattenedEdge>,
    right: &mut BTreeMap<String, FlattenedEdge>,
) -> Vec<(FlattenedEdge, FlattenedEdge)> {
    let mut left_by_base: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, line) in left.iter() {
        left_by_base.entry(line.base_key.clone()).or_default().push(key.clone());
    }
    let mut right_by_base: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, line) in right.iter() {
        right_by_base.entry(line.base_key.clone()).or_default().push(key.clone());
    }

    let mut pairs = Vec::new();
    for (base, left_keys) in left_by_base {
        let Some(right_keys) = right_by_base.get(&base) else {
            continue;
        };
        for (lk, rk) in left_keys.iter().zip(right_keys) {
            if let (Some(before), Some(after)) = (left.remove(lk), right.remove(rk)) {
                pairs.push((before, after));
            }
        }
    }
    pairs
}

/// Compare two trees with a mode given by name.
///
/// The mode name replaces `options.mode`; unknown names are an
/// `InvalidArgument` error.
pub fn compare(
    left: &BomTree,
    right: &BomTree,
    mode: &str,
    options: &CompareOptions,
) -> Result<DiffReport> {
    let options = CompareOptions {
        mode: CompareMode::parse(mode)?,
        ..options.clone()
    };
    DiffEngine::new(options).compare(left, right)
}

/// Highest severity in a report's changed entries.
#[must_use]
pub fn max_severity(report: &DiffReport) -> Option<Severity> {
    report.changed.iter().map(|c| c.severity).max()
}
