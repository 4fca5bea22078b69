//! Configuration types.

use crate::bom::{BuildOptions, DEFAULT_HARD_DEPTH_LIMIT, DEFAULT_MAX_DEPTH};
use crate::diff::{
    CompareMode, CompareOptions, DiffFilter, LineKeyScheme, Severity, DEFAULT_QUANTITY_TOLERANCE,
};
use crate::reports::ReportFormat;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration, loadable from `.bom-tools.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    pub traversal: TraversalConfig,
    pub compare: CompareConfig,
    pub filtering: FilterConfig,
    pub output: OutputConfig,
}

// ============================================================================
// Sub-configuration Types
// ============================================================================

/// Tree expansion settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TraversalConfig {
    /// Levels to expand below the root; -1 for unbounded
    #[schemars(range(min = -1))]
    pub max_depth: i32,
    /// Absolute ceiling applied even to unbounded expansion
    #[schemars(range(min = 1))]
    pub hard_depth_limit: usize,
    /// Relationship types to follow; empty follows all
    pub relationship_types: Vec<String>,
    /// Attach substitutes to every expanded line
    pub include_substitutes: bool,
    /// Attach effectivity records to every expanded line
    pub include_effectivity: bool,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            hard_depth_limit: DEFAULT_HARD_DEPTH_LIMIT,
            relationship_types: Vec::new(),
            include_substitutes: false,
            include_effectivity: false,
        }
    }
}

impl TraversalConfig {
    /// Build options without selection or effectivity filters.
    #[must_use]
    pub fn build_options(&self) -> BuildOptions {
        let mut options = BuildOptions::with_max_depth(self.max_depth)
            .hard_depth_limit(self.hard_depth_limit)
            .include_substitutes(self.include_substitutes)
            .include_effectivity(self.include_effectivity);
        if !self.relationship_types.is_empty() {
            options = options.relationship_types(self.relationship_types.iter().cloned());
        }
        options
    }
}

/// Diff settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CompareConfig {
    pub mode: CompareMode,
    /// Overrides the mode's line key scheme
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_key: Option<LineKeyScheme>,
    /// Attach parent/child descriptors to reported lines
    pub include_child_fields: bool,
    /// Overrides the mode's compared relationship properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_relationship_props: Option<Vec<String>>,
    pub include_substitutes: bool,
    pub include_effectivity: bool,
    /// Report the number of unchanged lines
    pub include_unchanged: bool,
    /// Numeric differences up to this value are ignored
    #[schemars(range(min = 0.0))]
    pub quantity_tolerance: f64,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            mode: CompareMode::default(),
            line_key: None,
            include_child_fields: false,
            include_relationship_props: None,
            include_substitutes: false,
            include_effectivity: false,
            include_unchanged: false,
            quantity_tolerance: DEFAULT_QUANTITY_TOLERANCE,
        }
    }
}

impl CompareConfig {
    #[must_use]
    pub fn compare_options(&self) -> CompareOptions {
        CompareOptions {
            mode: self.mode,
            line_key: self.line_key,
            include_child_fields: self.include_child_fields,
            include_relationship_props: self.include_relationship_props.clone(),
            include_substitutes: self.include_substitutes,
            include_effectivity: self.include_effectivity,
            include_unchanged: self.include_unchanged,
            quantity_tolerance: self.quantity_tolerance,
        }
    }
}

/// Filters applied to changed lines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FilterConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_severity: Option<Severity>,
    /// Minimum absolute quantity delta
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_quantity_delta: Option<f64>,
    /// Maximum absolute quantity delta
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_quantity_delta: Option<f64>,
}

impl FilterConfig {
    #[must_use]
    pub const fn diff_filter(&self) -> DiffFilter {
        DiffFilter {
            min_severity: self.min_severity,
            min_quantity_delta: self.min_quantity_delta,
            max_quantity_delta: self.max_quantity_delta,
        }
    }
}

/// Output-related configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    pub format: ReportFormat,
    /// Output file path (None for stdout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// CSV delimiter, a single character
    pub delimiter: String,
    /// Disable colored output
    pub no_color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::default(),
            file: None,
            delimiter: ",".to_string(),
            no_color: false,
        }
    }
}
