//! Data model for the product structure engine.
//!
//! Nodes and edges are read-only views over the graph store: an [`Edge`] is a
//! relationship item whose `source_id` is the parent and `related_id` the
//! child. Traversals produce a fresh [`BomTree`], an arena of entries linked
//! by index, which never mirrors the (possibly cyclic) store graph.
//!
//! ```ignore
//! let tree = TreeBuilder::new(&store).build("A", &BuildOptions::unbounded())?;
//! for visit in tree.edges() {
//!     println!("{} -> {} (level {})", visit.parent.id, visit.child.id, visit.level);
//! }
//! ```

mod item;
mod selection;
mod tree;

pub use item::*;
pub use selection::*;
pub use tree::*;
