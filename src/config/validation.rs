//! Configuration validation.

use super::types::{AppConfig, CompareConfig, FilterConfig, OutputConfig, TraversalConfig};
use crate::reports::parse_delimiter;

// ============================================================================
// Configuration Error
// ============================================================================

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.traversal.validate());
        errors.extend(self.compare.validate());
        errors.extend(self.filtering.validate());
        errors.extend(self.output.validate());
        errors
    }
}

impl Validatable for TraversalConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.max_depth < -1 {
            errors.push(ConfigError::new(
                "traversal.max_depth",
                format!("must be -1 (unbounded) or non-negative, got {}", self.max_depth),
            ));
        }
        if self.hard_depth_limit == 0 {
            errors.push(ConfigError::new(
                "traversal.hard_depth_limit",
                "must be at least 1",
            ));
        }
        if self.relationship_types.iter().any(|t| t.trim().is_empty()) {
            errors.push(ConfigError::new(
                "traversal.relationship_types",
                "relationship type names must not be empty",
            ));
        }
        errors
    }
}

impl Validatable for CompareConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if !self.quantity_tolerance.is_finite() || self.quantity_tolerance < 0.0 {
            errors.push(ConfigError::new(
                "compare.quantity_tolerance",
                format!("must be a non-negative number, got {}", self.quantity_tolerance),
            ));
        }
        if let Some(props) = &self.include_relationship_props {
            if props.iter().any(|p| p.trim().is_empty()) {
                errors.push(ConfigError::new(
                    "compare.include_relationship_props",
                    "property names must not be empty",
                ));
            }
        }
        errors
    }
}

impl Validatable for FilterConfig {
    fn validate(&self) -> Vec<ConfigError> {
        match self.diff_filter().validate() {
            Ok(()) => Vec::new(),
            Err(err) => vec![ConfigError::new("filtering", err.to_string())],
        }
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if let Err(err) = parse_delimiter(&self.delimiter) {
            errors.push(ConfigError::new("output.delimiter", err.to_string()));
        }
        if let Some(file_path) = &self.file {
            if let Some(parent) = file_path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    errors.push(ConfigError::new(
                        "output.file",
                        format!("parent directory does not exist: {}", parent.display()),
                    ));
                }
            }
        }
        errors
    }
}
