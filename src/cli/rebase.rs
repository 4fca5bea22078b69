//! `rebase` command handler.

use super::exit_codes;
use super::input::load_snapshot;
use super::output::{write_output, OutputTarget};
use crate::config::OutputConfig;
use crate::diff::{detect_rebase_conflicts, level1_changes, needs_rebase, Conflict, Level1Change};
use crate::reports::ReportFormat;
use anyhow::Result;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Arguments of the `rebase` command.
#[derive(Debug, Clone)]
pub struct RebaseCommand {
    /// Snapshot the change order started from
    pub base: PathBuf,
    /// Change order's edited structure
    pub mine: PathBuf,
    /// Current product structure
    pub theirs: PathBuf,
    pub output: OutputConfig,
    pub quiet: bool,
}

#[derive(Debug, Serialize)]
struct RebaseReport {
    needs_rebase: bool,
    /// Level-1 edits of the change order relative to its base
    changes: Vec<Level1Change>,
    conflicts: Vec<Conflict>,
}

/// Check whether a change order can be rebased onto the current structure.
///
/// Exits with [`exit_codes::CHANGES_DETECTED`] when conflicts are found.
pub fn run_rebase(command: RebaseCommand) -> Result<i32> {
    let base = load_snapshot(&command.base)?;
    let mine = load_snapshot(&command.mine)?;
    let theirs = load_snapshot(&command.theirs)?;

    let rebase_needed = needs_rebase(&base, &theirs);
    let report = RebaseReport {
        needs_rebase: rebase_needed,
        changes: level1_changes(&base, &mine),
        conflicts: if rebase_needed {
            detect_rebase_conflicts(&base, &mine, &theirs)
        } else {
            Vec::new()
        },
    };

    let content = match command.output.format {
        ReportFormat::Json => serde_json::to_string_pretty(&report)?,
        ReportFormat::Summary | ReportFormat::Csv => render_summary(&report),
    };
    write_output(
        &content,
        &OutputTarget::from_option(command.output.file),
        command.quiet,
    )?;

    Ok(if report.conflicts.is_empty() {
        exit_codes::SUCCESS
    } else {
        exit_codes::CHANGES_DETECTED
    })
}

fn render_summary(report: &RebaseReport) -> String {
    let mut out = String::new();
    if !report.needs_rebase {
        out.push_str("Structure unchanged since the change order started; no rebase needed\n");
    }
    let _ = writeln!(out, "{} level-1 change(s):", report.changes.len());
    for change in &report.changes {
        let _ = writeln!(out, "  {} {}", change.op, change.child_item_id);
    }
    if report.conflicts.is_empty() {
        out.push_str("No conflicts\n");
    } else {
        let _ = writeln!(out, "{} conflict(s):", report.conflicts.len());
        for conflict in &report.conflicts {
            let _ = writeln!(out, "  {}: {}", conflict.child_item_id, conflict.reason);
        }
    }
    out
}
