//! Configuration file loading and discovery.

use super::types::AppConfig;
use crate::error::{BomError, ErrorContext, Result};
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration File Discovery
// ============================================================================

/// Standard config file names to search for.
const CONFIG_FILE_NAMES: &[&str] = &[
    ".bom-tools.yaml",
    ".bom-tools.yml",
    "bom-tools.yaml",
    "bom-tools.yml",
];

/// Discover a config file by searching standard locations.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Current directory
/// 3. Git repository root (if in a repo)
/// 4. User config directory (~/.config/bom-tools/)
/// 5. Home directory
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    if let Some(path) = std::env::current_dir()
        .ok()
        .and_then(|cwd| find_config_in_dir(&cwd))
    {
        return Some(path);
    }

    if let Some(path) = find_git_root().and_then(|root| find_config_in_dir(&root)) {
        return Some(path);
    }

    if let Some(path) = dirs::config_dir().and_then(|dir| find_config_in_dir(&dir.join("bom-tools"))) {
        return Some(path);
    }

    dirs::home_dir().and_then(|home| find_config_in_dir(&home))
}

/// Find a config file in a specific directory.
fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Find the git repository root by walking up the directory tree.
fn find_git_root() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let mut current = cwd.as_path();
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Load an `AppConfig` from a YAML file.
pub fn load_config_file(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Err(BomError::not_found("config file", path.display().to_string()));
    }
    let content = std::fs::read_to_string(path).map_err(|e| BomError::io(path, e))?;
    let config: AppConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

/// Load config from discovered file, or return default.
#[must_use]
pub fn load_or_default(explicit_path: Option<&Path>) -> (AppConfig, Option<PathBuf>) {
    discover_config_file(explicit_path).map_or_else(
        || (AppConfig::default(), None),
        |path| match load_config_file(&path) {
            Ok(config) => (config, Some(path)),
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                (AppConfig::default(), None)
            }
        },
    )
}

// ============================================================================
// Configuration Merging
// ============================================================================

impl AppConfig {
    /// Merge another config into this one, with non-default values of
    /// `other` taking precedence.
    ///
    /// Used for layering CLI args over file config.
    pub fn merge(&mut self, other: &Self) {
        let defaults = Self::default();

        if other.traversal.max_depth != defaults.traversal.max_depth {
            self.traversal.max_depth = other.traversal.max_depth;
        }
        if other.traversal.hard_depth_limit != defaults.traversal.hard_depth_limit {
            self.traversal.hard_depth_limit = other.traversal.hard_depth_limit;
        }
        if !other.traversal.relationship_types.is_empty() {
            self.traversal
                .relationship_types
                .clone_from(&other.traversal.relationship_types);
        }
        if other.traversal.include_substitutes {
            self.traversal.include_substitutes = true;
        }
        if other.traversal.include_effectivity {
            self.traversal.include_effectivity = true;
        }

        if other.compare.mode != defaults.compare.mode {
            self.compare.mode = other.compare.mode;
        }
        if other.compare.line_key.is_some() {
            self.compare.line_key = other.compare.line_key;
        }
        if other.compare.include_relationship_props.is_some() {
            self.compare
                .include_relationship_props
                .clone_from(&other.compare.include_relationship_props);
        }
        if other.compare.include_child_fields {
            self.compare.include_child_fields = true;
        }
        if other.compare.include_substitutes {
            self.compare.include_substitutes = true;
        }
        if other.compare.include_effectivity {
            self.compare.include_effectivity = true;
        }
        if other.compare.include_unchanged {
            self.compare.include_unchanged = true;
        }
        if other.compare.quantity_tolerance != defaults.compare.quantity_tolerance {
            self.compare.quantity_tolerance = other.compare.quantity_tolerance;
        }

        if other.filtering.min_severity.is_some() {
            self.filtering.min_severity = other.filtering.min_severity;
        }
        if other.filtering.min_quantity_delta.is_some() {
            self.filtering.min_quantity_delta = other.filtering.min_quantity_delta;
        }
        if other.filtering.max_quantity_delta.is_some() {
            self.filtering.max_quantity_delta = other.filtering.max_quantity_delta;
        }

        if other.output.format != defaults.output.format {
            self.output.format = other.output.format;
        }
        if other.output.file.is_some() {
            self.output.file.clone_from(&other.output.file);
        }
        if other.output.delimiter != defaults.output.delimiter {
            self.output.delimiter.clone_from(&other.output.delimiter);
        }
        if other.output.no_color {
            self.output.no_color = true;
        }
    }

    /// Load from file and merge with CLI overrides.
    #[must_use]
    pub fn from_file_with_overrides(
        config_path: Option<&Path>,
        cli_overrides: &Self,
    ) -> (Self, Option<PathBuf>) {
        let (mut config, loaded_from) = load_or_default(config_path);
        config.merge(cli_overrides);
        (config, loaded_from)
    }
}

// ============================================================================
// Example Config Generation
// ============================================================================

/// Generate an example config file content.
#[must_use]
pub fn generate_example_config() -> String {
    format!(
        "# BOM tools configuration\n# Place this file at .bom-tools.yaml in your project root or ~/.config/bom-tools/\n\n{}",
        serde_yaml::to_string(&AppConfig::default()).unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{CompareMode, Severity};
    use crate::reports::ReportFormat;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_yaml_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "compare:\n  mode: by_reference\n  include_unchanged: true\nfiltering:\n  min_severity: minor\noutput:\n  format: csv\n  delimiter: \";\""
        )
        .unwrap();

        let config = load_config_file(file.path()).unwrap();
        assert_eq!(config.compare.mode, CompareMode::ByReference);
        assert!(config.compare.include_unchanged);
        assert_eq!(config.filtering.min_severity, Some(Severity::Minor));
        assert_eq!(config.output.format, ReportFormat::Csv);
        assert_eq!(config.output.delimiter, ";");
        assert_eq!(config.traversal.max_depth, 10);
    }

    #[test]
    fn test_broken_file_falls_back_to_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "compare: [not, a, mapping").unwrap();
        assert!(load_config_file(file.path()).is_err());

        let (config, loaded_from) = load_or_default(Some(file.path()));
        assert_eq!(config, AppConfig::default());
        assert!(loaded_from.is_none());
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let mut base = AppConfig::default();
        base.compare.mode = CompareMode::Summarized;
        base.output.delimiter = ";".to_string();

        let mut overrides = AppConfig::default();
        overrides.compare.mode = CompareMode::ByPosition;
        overrides.traversal.max_depth = -1;

        base.merge(&overrides);
        assert_eq!(base.compare.mode, CompareMode::ByPosition);
        assert_eq!(base.traversal.max_depth, -1);
        assert_eq!(base.output.delimiter, ";");
    }

    #[test]
    fn test_example_config_parses() {
        let example = generate_example_config();
        let parsed: AppConfig = serde_yaml::from_str(&example).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }
}
