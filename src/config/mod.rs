//! Configuration for bom-tools.
//!
//! - Type-safe configuration structures with JSON schema
//! - Validation for all configuration values
//! - YAML config file loading and discovery
//! - CLI argument merging
//!
//! # Configuration File
//!
//! Place a `.bom-tools.yaml` file in your project root or
//! `~/.config/bom-tools/`:
//!
//! ```yaml
//! traversal:
//!   max_depth: -1
//! compare:
//!   mode: by_position
//!   include_unchanged: true
//! output:
//!   format: csv
//!   delimiter: ";"
//! ```

pub mod file;
mod types;
mod validation;

pub use file::{discover_config_file, generate_example_config, load_config_file, load_or_default};
pub use types::{AppConfig, CompareConfig, FilterConfig, OutputConfig, TraversalConfig};
pub use validation::{ConfigError, Validatable};

/// Generate a JSON Schema for the `AppConfig` configuration format.
///
/// The schema documents every option accepted in `.bom-tools.yaml` and can
/// be used by editors for validation and autocompletion.
pub fn generate_json_schema() -> crate::error::Result<String> {
    let schema = schemars::schema_for!(AppConfig);
    Ok(serde_json::to_string_pretty(&schema)?)
}
