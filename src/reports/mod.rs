//! Report generation for BOM diff results.
//!
//! - Summary: compact, human-readable terminal output
//! - JSON: the full report with tool metadata
//! - CSV: the flat row layout from [`export`]

mod csv;
pub mod export;
mod json;
mod summary;

pub use csv::CsvReporter;
pub use export::{
    delta_rows, export_csv, export_delta_csv, export_rows, parse_delimiter, rows_to_csv,
    ExportRow, EXPORT_COLUMNS,
};
pub use json::JsonReporter;
pub use summary::SummaryReporter;

use crate::diff::DiffReport;
use crate::error::BomError;
use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::Write;
use thiserror::Error;

/// Errors that can occur during report generation
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Bom(#[from] BomError),
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Brief summary output
    #[default]
    Summary,
    /// Structured JSON output
    Json,
    /// Delimited rows for spreadsheet import
    Csv,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Summary => write!(f, "summary"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Settings shared by all reporters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    /// Label of the left-hand (before) structure
    pub left_label: String,
    /// Label of the right-hand (after) structure
    pub right_label: String,
    /// CSV field delimiter, a single character
    pub delimiter: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            left_label: "left".to_string(),
            right_label: "right".to_string(),
            delimiter: ",".to_string(),
        }
    }
}

impl ReportConfig {
    #[must_use]
    pub fn with_labels(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.left_label = left.into();
        self.right_label = right.into();
        self
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }
}

/// Trait for report generators
pub trait ReportGenerator {
    /// Generate a report from diff results
    fn generate_diff_report(
        &self,
        report: &DiffReport,
        config: &ReportConfig,
    ) -> Result<String, ReportError>;

    /// Write report to a writer
    fn write_diff_report(
        &self,
        report: &DiffReport,
        config: &ReportConfig,
        writer: &mut dyn Write,
    ) -> Result<(), ReportError> {
        let rendered = self.generate_diff_report(report, config)?;
        writer.write_all(rendered.as_bytes())?;
        Ok(())
    }

    /// Get the format this generator produces
    fn format(&self) -> ReportFormat;
}

/// Create a report generator for the given format
#[must_use]
pub fn create_reporter(format: ReportFormat, use_color: bool) -> Box<dyn ReportGenerator> {
    match format {
        ReportFormat::Summary => {
            if use_color {
                Box::new(SummaryReporter::new())
            } else {
                Box::new(SummaryReporter::new().no_color())
            }
        }
        ReportFormat::Json => Box::new(JsonReporter::new()),
        ReportFormat::Csv => Box::new(CsvReporter::new()),
    }
}
