//! `check-cycle` command handler.

use super::exit_codes;
use super::input::load_store;
use super::output::{write_output, OutputTarget};
use crate::bom::detect_cycle;
use crate::config::OutputConfig;
use crate::reports::ReportFormat;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Arguments of the `check-cycle` command.
#[derive(Debug, Clone)]
pub struct CycleCommand {
    pub store: PathBuf,
    pub parent: String,
    pub child: String,
    pub output: OutputConfig,
    pub quiet: bool,
}

/// Check whether adding `parent -> child` would close a cycle.
///
/// Exits with [`exit_codes::CHANGES_DETECTED`] when it would.
pub fn run_check_cycle(command: CycleCommand) -> Result<i32> {
    let store = load_store(&command.store)?;
    let result = detect_cycle(&store, &command.parent, &command.child).with_context(|| {
        format!("Failed to check {} -> {}", command.parent, command.child)
    })?;

    let content = match command.output.format {
        ReportFormat::Json => serde_json::to_string_pretty(&result)?,
        ReportFormat::Summary | ReportFormat::Csv => match &result.path {
            Some(path) if result.has_cycle => format!(
                "Adding {} -> {} would create a cycle: {}",
                command.parent,
                command.child,
                path.join(" -> ")
            ),
            _ => format!("Adding {} -> {} is safe", command.parent, command.child),
        },
    };
    write_output(
        &content,
        &OutputTarget::from_option(command.output.file),
        command.quiet,
    )?;

    Ok(if result.has_cycle {
        exit_codes::CHANGES_DETECTED
    } else {
        exit_codes::SUCCESS
    })
}
