//! CSV report generator.

use super::export::export_csv;
use super::{ReportConfig, ReportError, ReportFormat, ReportGenerator};
use crate::diff::DiffReport;

/// CSV report generator.
pub struct CsvReporter;

impl CsvReporter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for CsvReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for CsvReporter {
    fn generate_diff_report(
        &self,
        report: &DiffReport,
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        Ok(export_csv(report, &config.delimiter)?)
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Csv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::CompareMode;

    #[test]
    fn test_bad_delimiter_is_reported() {
        let report = DiffReport::new(CompareMode::Summarized);
        let config = ReportConfig::default().with_delimiter("||");
        let err = CsvReporter::new().generate_diff_report(&report, &config).unwrap_err();
        assert!(matches!(err, ReportError::Bom(ref e) if e.is_invalid_argument()));
    }

    #[test]
    fn test_empty_report_is_header_only() {
        let report = DiffReport::new(CompareMode::Summarized);
        let csv = CsvReporter::new()
            .generate_diff_report(&report, &ReportConfig::default())
            .unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
