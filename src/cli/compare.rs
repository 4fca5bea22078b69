//! `compare` command handler.

use super::exit_codes;
use super::input::TreeInput;
use super::output::{write_output, OutputTarget};
use crate::config::AppConfig;
use crate::diff::{DeltaPreview, DiffEngine, DiffReport};
use crate::reports::{create_reporter, export_delta_csv, ReportConfig, ReportFormat};
use anyhow::{Context, Result};

/// Arguments of the `compare` command.
#[derive(Debug, Clone)]
pub struct CompareCommand {
    pub left: TreeInput,
    pub right: TreeInput,
    pub config: AppConfig,
    /// Emit the patch-style delta preview instead of the diff
    pub delta: bool,
    /// Exit with code 0 even when changes are found
    pub no_fail_on_change: bool,
    pub quiet: bool,
}

/// Compare two BOM trees and write the report.
pub fn run_compare(command: CompareCommand) -> Result<i32> {
    let config = &command.config;
    let build_options = config.traversal.build_options();

    let (left, right) = rayon::join(
        || command.left.resolve(&build_options),
        || command.right.resolve(&build_options),
    );
    let left = left.with_context(|| format!("Failed to load {}", command.left.label()))?;
    let right = right.with_context(|| format!("Failed to load {}", command.right.label()))?;

    if !command.quiet {
        tracing::info!(
            "Comparing {} lines against {} lines ({} mode)",
            left.edge_count(),
            right.edge_count(),
            config.compare.mode
        );
    }

    let report = DiffEngine::new(config.compare.compare_options()).compare(&left, &right)?;
    let report = config.filtering.diff_filter().apply(report)?;

    let report_config = ReportConfig::default()
        .with_labels(command.left.label(), command.right.label())
        .with_delimiter(config.output.delimiter.clone());
    let content = if command.delta {
        render_delta(&report, config.output.format, &report_config)?
    } else {
        let use_color = !config.output.no_color
            && config.output.file.is_none()
            && std::env::var_os("NO_COLOR").is_none();
        create_reporter(config.output.format, use_color)
            .generate_diff_report(&report, &report_config)?
    };
    write_output(
        &content,
        &OutputTarget::from_option(config.output.file.clone()),
        command.quiet,
    )?;

    Ok(determine_exit_code(&command, &report))
}

fn render_delta(
    report: &DiffReport,
    format: ReportFormat,
    config: &ReportConfig,
) -> Result<String> {
    let preview = DeltaPreview::from_report(report);
    let content = match format {
        ReportFormat::Csv => export_delta_csv(&preview, &config.delimiter)?,
        ReportFormat::Json | ReportFormat::Summary => serde_json::to_string_pretty(&preview)?,
    };
    Ok(content)
}

const fn determine_exit_code(command: &CompareCommand, report: &DiffReport) -> i32 {
    let has_changes = report.summary.added + report.summary.removed + report.summary.changed > 0;
    if has_changes && !command.no_fail_on_change {
        exit_codes::CHANGES_DETECTED
    } else {
        exit_codes::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::CompareMode;
    use crate::model::{BomTree, Edge, Node, TreeEdge};

    fn write_tree(dir: &std::path::Path, name: &str, qty: i64) -> std::path::PathBuf {
        let mut tree = BomTree::new(Node::new("A"));
        let root = tree.root();
        tree.push_child(
            root,
            TreeEdge::plain(Edge::new("r1", "A", "X").with_quantity(qty)),
            Node::new("X"),
        );
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string(&tree).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_compare_snapshots_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let left = write_tree(dir.path(), "left.json", 1);
        let right = write_tree(dir.path(), "right.json", 4);
        let out = dir.path().join("diff.csv");

        let mut config = AppConfig::default();
        config.compare.mode = CompareMode::Summarized;
        config.output.format = ReportFormat::Csv;
        config.output.file = Some(out.clone());

        let command = CompareCommand {
            left: TreeInput::Snapshot(left),
            right: TreeInput::Snapshot(right),
            config,
            delta: false,
            no_fail_on_change: false,
            quiet: true,
        };
        assert_eq!(run_compare(command.clone()).unwrap(), exit_codes::CHANGES_DETECTED);
        let csv = std::fs::read_to_string(&out).unwrap();
        assert!(csv.contains("update,ROOT::X,A,X,r1,major,quantity,1,4"));

        let quiet = CompareCommand {
            no_fail_on_change: true,
            ..command
        };
        assert_eq!(run_compare(quiet).unwrap(), exit_codes::SUCCESS);
    }
}
