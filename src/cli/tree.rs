//! `tree` command handler.

use super::exit_codes;
use super::input::load_store;
use super::output::{write_output, OutputTarget};
use crate::bom::{apply_variant_rules, TreeBuilder};
use crate::config::{OutputConfig, TraversalConfig};
use crate::diff::normalize::format_quantity;
use crate::effectivity::EffectivityContext;
use crate::model::{BomTree, ConfigSelection, NodeIndex};
use crate::reports::ReportFormat;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::PathBuf;

/// Arguments of the `tree` command.
#[derive(Debug, Clone)]
pub struct TreeCommand {
    pub store: PathBuf,
    pub root: String,
    pub traversal: TraversalConfig,
    pub selection: Option<ConfigSelection>,
    pub effectivity: Option<EffectivityContext>,
    pub output: OutputConfig,
    pub quiet: bool,
}

/// Expand a root item and print the tree.
///
/// JSON output is the nested snapshot form, loadable again by `compare`.
pub fn run_tree(command: TreeCommand) -> Result<i32> {
    let store = load_store(&command.store)?;
    let mut options = command.traversal.build_options();
    if let Some(selection) = &command.selection {
        options = options.selection(selection.clone());
    }
    if let Some(ctx) = command.effectivity {
        options = options.effective_at(ctx);
    }

    let mut tree = TreeBuilder::with_collaborators(&store)
        .build(&command.root, &options)
        .with_context(|| format!("Failed to expand {}", command.root))?;

    // Variant rules only take part when a configuration is selected
    if let Some(selection) = &command.selection {
        if !store.variant_rules().is_empty() {
            tree = apply_variant_rules(&store, &tree, store.variant_rules(), selection)
                .with_context(|| format!("Failed to apply variant rules to {}", command.root))?;
        }
    }

    if !command.quiet {
        tracing::info!(
            "Expanded {}: {} lines, depth {}",
            command.root,
            tree.edge_count(),
            tree.depth()
        );
    }

    let content = match command.output.format {
        ReportFormat::Json => serde_json::to_string_pretty(&tree)?,
        ReportFormat::Summary | ReportFormat::Csv => render_tree(&tree),
    };
    write_output(
        &content,
        &OutputTarget::from_option(command.output.file),
        command.quiet,
    )?;
    Ok(exit_codes::SUCCESS)
}

/// Indented text rendering, one line per node.
pub(crate) fn render_tree(tree: &BomTree) -> String {
    let mut out = String::new();
    let root = tree.root_node();
    let _ = writeln!(out, "{}", describe(&root.id, root.name()));
    render_children(tree, tree.root(), 1, &mut out);
    out
}

fn render_children(tree: &BomTree, index: NodeIndex, depth: usize, out: &mut String) {
    for (via, child) in tree.children(index) {
        let node = tree.node(child);
        let _ = writeln!(
            out,
            "{}{}  x{}  [{}]",
            "  ".repeat(depth),
            describe(&node.id, node.name()),
            format_quantity(via.edge.quantity()),
            via.edge.id
        );
        render_children(tree, child, depth + 1, out);
    }
}

fn describe(id: &str, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{id} ({name})"),
        None => id.to_string(),
    }
}
