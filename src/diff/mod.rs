//! Structural comparison of BOM trees.
//!
//! Both trees are flattened into maps keyed by a canonical *line key*
//! (see [`LineKeyScheme`]) whose composition depends on the [`CompareMode`].
//! Lines are then matched by key: keys only on the right are `added`, keys
//! only on the left are `removed`, and matched lines whose compared fields
//! differ beyond tolerance are `changed`.
//!
//! ```
//! use bom_tools::diff::{compare, CompareOptions};
//! use bom_tools::model::{BomTree, Edge, Node, TreeEdge};
//!
//! let mut left = BomTree::new(Node::new("A"));
//! let root = left.root();
//! left.push_child(
//!     root,
//!     TreeEdge::plain(Edge::new("r1", "A", "X").with_property("find_num", "10")),
//!     Node::new("X"),
//! );
//! let report = compare(&left, &left, "by_position", &CompareOptions::default()).unwrap();
//! assert!(!report.has_changes());
//! ```
//!
//! Rebase conflict detection ([`detect_rebase_conflicts`]) and the
//! change-order helpers work on level-1 children only.

mod delta;
mod engine;
mod filter;
mod flatten;
mod mode;
pub mod normalize;
mod rebase;
mod result;

pub use delta::{ChangeOp, DeltaChange, DeltaOp, DeltaPreview, DeltaSummary};
pub use engine::{compare, max_severity, CompareOptions, DiffEngine, DEFAULT_QUANTITY_TOLERANCE};
pub use filter::DiffFilter;
pub use flatten::{flatten, EdgeDescriptor, FlattenOptions, FlattenedEdge, MIXED_UOM};
pub use mode::{CompareMode, LineKeyScheme, Severity};
pub use normalize::{normalize, NormValue, NormalizedProperties, ROOT_SENTINEL};
pub use rebase::{
    detect_rebase_conflicts, level1_changes, level1_lines, needs_rebase, Conflict, Level1Change,
    CONCURRENT_MODIFICATION,
};
pub use result::{ChangedEdge, DiffReport, DiffSummary, FieldChange};
