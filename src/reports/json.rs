//! JSON report generator.

use super::{ReportConfig, ReportError, ReportFormat, ReportGenerator};
use crate::diff::{DeltaPreview, DiffReport};
use chrono::Utc;
use serde::Serialize;

/// JSON report generator
pub struct JsonReporter {
    /// Also emit the patch-style delta preview
    include_delta: bool,
    /// Pretty print output
    pretty: bool,
}

impl JsonReporter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            include_delta: false,
            pretty: true,
        }
    }

    #[must_use]
    pub const fn with_delta(mut self, include: bool) -> Self {
        self.include_delta = include;
        self
    }

    /// Set pretty printing
    #[must_use]
    pub const fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonDiffReport<'a> {
    metadata: JsonReportMetadata<'a>,
    #[serde(flatten)]
    report: &'a DiffReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    delta: Option<DeltaPreview>,
}

#[derive(Serialize)]
struct JsonReportMetadata<'a> {
    tool: ToolInfo,
    generated_at: String,
    left: &'a str,
    right: &'a str,
}

#[derive(Serialize)]
struct ToolInfo {
    name: &'static str,
    version: &'static str,
}

impl ReportGenerator for JsonReporter {
    fn generate_diff_report(
        &self,
        report: &DiffReport,
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let document = JsonDiffReport {
            metadata: JsonReportMetadata {
                tool: ToolInfo {
                    name: env!("CARGO_PKG_NAME"),
                    version: env!("CARGO_PKG_VERSION"),
                },
                generated_at: Utc::now().to_rfc3339(),
                left: &config.left_label,
                right: &config.right_label,
            },
            report,
            delta: self.include_delta.then(|| DeltaPreview::from_report(report)),
        };
        let json = if self.pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };
        Ok(json)
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Json
    }
}
