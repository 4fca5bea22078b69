//! Loading stores and tree snapshots from disk.

use crate::bom::{BuildOptions, TreeBuilder};
use crate::model::BomTree;
use crate::store::InMemoryGraphStore;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Where a tree for comparison comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeInput {
    /// A nested tree snapshot (JSON or YAML)
    Snapshot(PathBuf),
    /// Expand `root` from a store document
    Store { store: PathBuf, root: String },
}

impl TreeInput {
    pub fn label(&self) -> String {
        match self {
            Self::Snapshot(path) => path.display().to_string(),
            Self::Store { store, root } => format!("{root}@{}", store.display()),
        }
    }

    /// Load or build the tree.
    pub fn resolve(&self, options: &BuildOptions) -> Result<BomTree> {
        match self {
            Self::Snapshot(path) => load_snapshot(path),
            Self::Store { store, root } => {
                let store = load_store(store)?;
                TreeBuilder::with_collaborators(&store)
                    .build(root, options)
                    .with_context(|| format!("Failed to expand {root}"))
            }
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}

/// Load a store document.
pub fn load_store(path: &Path) -> Result<InMemoryGraphStore> {
    let store = InMemoryGraphStore::load(path)
        .with_context(|| format!("Failed to load store {}", path.display()))?;
    tracing::debug!(
        nodes = store.node_count(),
        edges = store.edge_count(),
        "loaded store {}",
        path.display()
    );
    Ok(store)
}

/// Load a nested tree snapshot; `.yaml`/`.yml` files are read as YAML.
pub fn load_snapshot(path: &Path) -> Result<BomTree> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let tree: BomTree = if is_yaml(path) {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))?
    };
    Ok(tree)
}
