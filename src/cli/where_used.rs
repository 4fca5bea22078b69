//! `where-used` command handler.

use super::exit_codes;
use super::input::load_store;
use super::output::{write_output, OutputTarget};
use crate::bom::where_used;
use crate::config::OutputConfig;
use crate::reports::ReportFormat;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::PathBuf;

/// Arguments of the `where-used` command.
#[derive(Debug, Clone)]
pub struct WhereUsedCommand {
    pub store: PathBuf,
    pub item: String,
    pub recursive: bool,
    pub max_levels: Option<usize>,
    pub output: OutputConfig,
    pub quiet: bool,
}

pub fn run_where_used(command: WhereUsedCommand) -> Result<i32> {
    let store = load_store(&command.store)?;
    let entries = where_used(&store, &command.item, command.recursive, command.max_levels)
        .with_context(|| format!("Failed to look up usages of {}", command.item))?;

    let content = match command.output.format {
        ReportFormat::Json => serde_json::to_string_pretty(&entries)?,
        ReportFormat::Summary | ReportFormat::Csv => {
            let mut out = format!("{} is used in {} place(s)\n", command.item, entries.len());
            for entry in &entries {
                let _ = writeln!(
                    out,
                    "{}L{} {} via {} ({} -> {})",
                    "  ".repeat(entry.level),
                    entry.level,
                    entry.parent.id,
                    entry.relationship.id,
                    entry.relationship.source_id,
                    entry.relationship.related_id
                );
            }
            out
        }
    };
    write_output(
        &content,
        &OutputTarget::from_option(command.output.file),
        command.quiet,
    )?;
    Ok(exit_codes::SUCCESS)
}
