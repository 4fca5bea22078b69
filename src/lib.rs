//! **Product structure (BOM) engine.**
//!
//! `bom-tools` expands, validates and compares multi-level bills of
//! materials held in a directed item graph. It works against a read-only
//! snapshot of a graph store and never mutates it.
//!
//! ## Core Concepts & Modules
//!
//! - **[`model`]**: items ([`Node`]), relationship items ([`Edge`]),
//!   configuration selections and the arena-backed [`BomTree`].
//! - **[`store`]**: the collaborator traits the engine consumes
//!   ([`GraphStore`], [`EffectivityOracle`], [`SubstituteProvider`]) and an
//!   in-memory implementation loadable from JSON or YAML.
//! - **[`bom`]**: [`TreeBuilder`] for bounded-depth expansion, the
//!   write-path [`CycleDetector`], the where-used query and variant rules.
//! - **[`condition`]** / **[`effectivity`]**: variant rules and
//!   date/lot/serial/unit effectivity deciding which lines apply.
//! - **[`diff`]**: line-key normalization, the [`DiffEngine`], result
//!   filtering, delta previews and level-1 rebase conflict detection.
//! - **[`reports`]**: summary, JSON and CSV output.
//!
//! ## Expanding and comparing structures
//!
//! ```
//! use bom_tools::{build_tree, compare, BuildOptions, CompareOptions, InMemoryGraphStore};
//! use bom_tools::model::{Edge, Node};
//!
//! let store = InMemoryGraphStore::new()
//!     .with_node(Node::new("A"))
//!     .with_node(Node::new("B"))
//!     .with_node(Node::new("C"))
//!     .with_edge(Edge::new("r1", "A", "B").with_quantity(2))
//!     .with_edge(Edge::new("r2", "B", "C").with_quantity(3));
//!
//! let tree = build_tree(&store, "A", &BuildOptions::unbounded()).unwrap();
//! assert_eq!(tree.depth(), 2);
//!
//! let report = compare(&tree, &tree, "summarized", &CompareOptions::default()).unwrap();
//! assert!(!report.has_changes());
//! ```
//!
//! ## Command-Line Interface (CLI)
//!
//! The `bom-tools` binary wraps these operations (`tree`, `where-used`,
//! `check-cycle`, `compare`, `rebase`) over store documents and tree
//! snapshots on disk.

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_excessive_bools,
    clippy::cast_precision_loss,
    clippy::similar_names
)]

pub mod bom;
pub mod cli;
pub mod condition;
pub mod config;
pub mod diff;
pub mod effectivity;
pub mod error;
pub mod model;
pub mod reports;
pub mod store;

// Re-export main types for convenience
pub use bom::{
    apply_variant_rules, build_tree, detect_cycle, where_used, BuildOptions, CycleDetector,
    CycleResult, RuleAction, TreeBuilder, VariantRule, WhereUsedEntry,
};
pub use config::{AppConfig, ConfigError, Validatable};
pub use diff::{
    compare, detect_rebase_conflicts, CompareMode, CompareOptions, Conflict, DeltaPreview,
    DiffEngine, DiffFilter, DiffReport, LineKeyScheme, Severity,
};
pub use effectivity::{Effectivity, EffectivityContext, EffectivityKind};
pub use error::{BomError, ErrorContext, OptionContext, Result};
pub use model::{BomTree, ConfigSelection, Edge, Node};
pub use reports::{ReportFormat, ReportGenerator};
pub use store::{EffectivityOracle, GraphStore, InMemoryGraphStore, SubstituteProvider};
