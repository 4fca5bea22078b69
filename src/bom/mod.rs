//! Product structure traversal.
//!
//! - [`TreeBuilder`]: expands a root into a depth-bounded [`BomTree`](crate::model::BomTree),
//!   admitting edges by relationship type, configuration condition and effectivity.
//! - [`CycleDetector`]: checks a proposed edge against the stored graph before
//!   it is written.
//! - [`where_used`]: reverse lookup of parent assemblies.
//! - [`apply_variant_rules`]: product-level [`VariantRule`]s applied to an
//!   expanded tree for one configuration selection.
//!
//! Stored data may contain cycles; traversals are bounded by depth, never by
//! trusting the graph to be acyclic.

mod cycle;
mod memo;
mod tree_builder;
mod variant;
mod where_used;

pub use cycle::{detect_cycle, CycleDetector, CycleResult};
pub use tree_builder::{
    build_tree, BuildOptions, TreeBuilder, DEFAULT_HARD_DEPTH_LIMIT, DEFAULT_MAX_DEPTH,
};
pub use variant::{apply_variant_rules, RuleAction, VariantRule, DEFAULT_RULE_PRIORITY};
pub use where_used::{where_used, WhereUsedEntry};
