//! Post-comparison filtering of changed lines.

use super::mode::Severity;
use super::result::{ChangedEdge, DiffReport};
use crate::error::{BomError, Result};

/// Filters applied to the `changed` entries of a [`DiffReport`].
///
/// Quantity bounds apply to the absolute `quantity_delta`; an entry with no
/// delta counts as `0`. Added and removed lines are never filtered.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiffFilter {
    pub min_severity: Option<Severity>,
    pub min_quantity_delta: Option<f64>,
    pub max_quantity_delta: Option<f64>,
}

impl DiffFilter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            min_severity: None,
            min_quantity_delta: None,
            max_quantity_delta: None,
        }
    }

    #[must_use]
    pub const fn with_min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = Some(severity);
        self
    }

    #[must_use]
    pub const fn with_quantity_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_quantity_delta = min;
        self.max_quantity_delta = max;
        self
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.min_severity.is_none()
            && self.min_quantity_delta.is_none()
            && self.max_quantity_delta.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        for (name, bound) in [
            ("min_quantity_delta", self.min_quantity_delta),
            ("max_quantity_delta", self.max_quantity_delta),
        ] {
            if let Some(value) = bound {
                if value.is_nan() {
                    return Err(BomError::invalid(format!("{name} must be a number")));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min_quantity_delta, self.max_quantity_delta) {
            if min > max {
                return Err(BomError::invalid(format!(
                    "min_quantity_delta ({min}) must not exceed max_quantity_delta ({max})"
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn matches(&self, changed: &ChangedEdge) -> bool {
        if let Some(min) = self.min_severity {
            if changed.severity < min {
                return false;
            }
        }
        let delta = changed.quantity_delta.unwrap_or(0.0).abs();
        if let Some(min) = self.min_quantity_delta {
            if delta < min {
                return false;
            }
        }
        if let Some(max) = self.max_quantity_delta {
            if delta > max {
                return false;
            }
        }
        true
    }

    /// Drop non-matching changed entries and recompute the summary.
    pub fn apply(&self, mut report: DiffReport) -> Result<DiffReport> {
        self.validate()?;
        if self.is_empty() {
            return Ok(report);
        }
        let before = report.changed.len();
        report.changed.retain(|c| self.matches(c));
        report.calculate_summary();
        tracing::debug!(
            kept = report.changed.len(),
            dropped = before - report.changed.len(),
            "filtered changed lines"
        );
        Ok(report)
    }
}
