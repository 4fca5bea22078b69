//! bom-tools: product structure expansion, cycle checks and BOM diff.

#![allow(clippy::needless_pass_by_value, clippy::struct_excessive_bools)]

use anyhow::{bail, Context, Result};
use bom_tools::{
    cli::{
        self, exit_codes, CompareCommand, CycleCommand, RebaseCommand, TreeCommand, TreeInput,
        WhereUsedCommand,
    },
    config::{generate_json_schema, AppConfig, Validatable},
    diff::{CompareMode, LineKeyScheme, Severity},
    effectivity::parse_timestamp,
    model::ConfigSelection,
    reports::ReportFormat,
    EffectivityContext,
};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bom-tools")]
#[command(version)]
#[command(about = "Product structure (BOM) expansion, cycle checks and structural diff", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  Success (no changes, no cycle, no conflicts)
    1  Changes detected / cycle detected / rebase conflicts
    3  Error occurred

EXAMPLES:
    # Expand a product structure from a store document
    bom-tools tree --store plm.json ASSY-100 --depth -1 -o json > baseline.json

    # Compare two snapshots line by line, by find number
    bom-tools compare baseline.json current.json --mode by_position

    # Compare two roots in one store and export CSV
    bom-tools compare --store plm.json ASSY-100 ASSY-200 --mode summarized -o csv

    # Check a proposed edge before writing it
    bom-tools check-cycle --store plm.json ASSY-100 SUB-7")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output (also respects `NO_COLOR` env)
    #[arg(long, global = true)]
    no_color: bool,

    /// Path to configuration file
    #[arg(long, global = true, env = "BOM_TOOLS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

// ============================================================================
// Command argument structs
// ============================================================================

/// Output selection shared by all commands
#[derive(Args)]
struct OutputArgs {
    /// Output format
    #[arg(short, long)]
    output: Option<ReportFormat>,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,
}

/// Traversal filters shared by `tree` and `compare`
#[derive(Args)]
struct TraversalArgs {
    /// Levels to expand below the root (-1 for unbounded)
    #[arg(long, allow_negative_numbers = true)]
    depth: Option<i32>,

    /// Relationship types to follow (repeatable; default: all)
    #[arg(long = "relationship-type", value_name = "TYPE")]
    relationship_types: Vec<String>,

    /// Attach substitutes to expanded lines
    #[arg(long)]
    include_substitutes: bool,

    /// Attach effectivity records to expanded lines
    #[arg(long)]
    include_effectivity: bool,
}

/// Arguments for the `tree` subcommand
#[derive(Args)]
struct TreeArgs {
    /// Store document (JSON or YAML)
    #[arg(long)]
    store: PathBuf,

    /// Root item id
    root: String,

    #[command(flatten)]
    traversal: TraversalArgs,

    /// Configuration selection, e.g. `Color=Red` (repeatable)
    #[arg(long = "select", value_name = "OPTION=VALUE")]
    selections: Vec<String>,

    /// Reference date for date effectivity
    #[arg(long, value_name = "DATE")]
    at: Option<String>,

    /// Lot number for lot effectivity
    #[arg(long)]
    lot: Option<String>,

    /// Serial number for serial effectivity
    #[arg(long)]
    serial: Option<String>,

    /// Unit position for unit effectivity
    #[arg(long)]
    unit: Option<String>,

    #[command(flatten)]
    output: OutputArgs,
}

/// Arguments for the `compare` subcommand
#[derive(Args)]
struct CompareArgs {
    /// Left (before) tree snapshot, or root id with --store
    left: String,

    /// Right (after) tree snapshot, or root id with --store
    right: String,

    /// Expand both roots from this store document instead of reading snapshots
    #[arg(long)]
    store: Option<PathBuf>,

    /// Compare mode (only_product, summarized, num_qty, by_position, by_reference)
    #[arg(short, long)]
    mode: Option<CompareMode>,

    /// Override the mode's line key scheme
    #[arg(long)]
    line_key: Option<LineKeyScheme>,

    /// Comma-separated relationship properties to compare instead of the mode's
    #[arg(long, value_delimiter = ',')]
    props: Option<Vec<String>>,

    /// Attach parent/child descriptors to reported lines
    #[arg(long)]
    include_child_fields: bool,

    /// Report the number of unchanged lines
    #[arg(long)]
    include_unchanged: bool,

    /// Ignore numeric differences up to this value
    #[arg(long)]
    tolerance: Option<f64>,

    /// Only report changed lines at or above this severity (info, minor, major)
    #[arg(long)]
    min_severity: Option<Severity>,

    /// Only report changed lines whose absolute quantity delta is at least this
    #[arg(long)]
    min_quantity_delta: Option<f64>,

    /// Only report changed lines whose absolute quantity delta is at most this
    #[arg(long)]
    max_quantity_delta: Option<f64>,

    /// Emit a delta preview (patch operations) instead of the diff
    #[arg(long)]
    delta: bool,

    /// CSV delimiter (a single character)
    #[arg(long)]
    delimiter: Option<String>,

    /// Exit with code 0 even when changes are detected
    #[arg(long)]
    no_fail_on_change: bool,

    #[command(flatten)]
    traversal: TraversalArgs,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand a root item into a product structure tree
    Tree(TreeArgs),

    /// List the assemblies that use an item
    WhereUsed {
        /// Store document (JSON or YAML)
        #[arg(long)]
        store: PathBuf,

        /// Item id
        item: String,

        /// Walk up through all ancestors
        #[arg(short, long)]
        recursive: bool,

        /// Maximum ancestor levels with --recursive
        #[arg(long)]
        max_levels: Option<usize>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Check whether adding PARENT -> CHILD would create a cycle
    CheckCycle {
        /// Store document (JSON or YAML)
        #[arg(long)]
        store: PathBuf,

        parent: String,

        child: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Compare two BOM trees
    Compare(CompareArgs),

    /// Check a change order against concurrent structure edits
    Rebase {
        /// Snapshot the change order started from
        base: PathBuf,

        /// Change order's edited snapshot
        mine: PathBuf,

        /// Current product snapshot
        theirs: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print the JSON schema of the configuration file
    ConfigSchema,

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Argument conversion
// ============================================================================

fn parse_selections(pairs: &[String]) -> Result<Option<ConfigSelection>> {
    if pairs.is_empty() {
        return Ok(None);
    }
    let mut selection = ConfigSelection::new();
    for pair in pairs {
        let Some((option, value)) = pair.split_once('=') else {
            bail!("invalid selection '{pair}', expected OPTION=VALUE");
        };
        selection.insert(option.trim(), value.trim());
    }
    Ok(Some(selection))
}

fn effectivity_context(args: &TreeArgs) -> Result<Option<EffectivityContext>> {
    let mut ctx = match &args.at {
        Some(at) => EffectivityContext::at(
            parse_timestamp(at).with_context(|| format!("invalid date '{at}'"))?,
        ),
        None => EffectivityContext::default(),
    };
    if let Some(lot) = &args.lot {
        ctx = ctx.with_lot(lot.clone());
    }
    if let Some(serial) = &args.serial {
        ctx = ctx.with_serial(serial.clone());
    }
    if let Some(unit) = &args.unit {
        ctx = ctx.with_unit(unit.clone());
    }
    Ok((!ctx.is_empty()).then_some(ctx))
}

fn apply_traversal(overrides: &mut AppConfig, args: &TraversalArgs) {
    if let Some(depth) = args.depth {
        overrides.traversal.max_depth = depth;
    }
    overrides
        .traversal
        .relationship_types
        .clone_from(&args.relationship_types);
    overrides.traversal.include_substitutes = args.include_substitutes;
    overrides.traversal.include_effectivity = args.include_effectivity;
}

fn apply_output(overrides: &mut AppConfig, args: &OutputArgs, no_color: bool) {
    if let Some(format) = args.output {
        overrides.output.format = format;
    }
    overrides.output.file.clone_from(&args.output_file);
    overrides.output.no_color = no_color;
}

/// Layer CLI overrides over the discovered config file and validate.
fn resolve_config(explicit: Option<&Path>, overrides: &AppConfig, quiet: bool) -> Result<AppConfig> {
    let (config, loaded_from) = AppConfig::from_file_with_overrides(explicit, overrides);
    if let Some(path) = loaded_from {
        if !quiet {
            tracing::info!("Using config {}", path.display());
        }
    }
    let errors = config.validate();
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        bail!("invalid configuration:\n  {}", messages.join("\n  "));
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<i32> {
    let quiet = cli.quiet;
    let explicit = cli.config.as_deref();

    match cli.command {
        Commands::Tree(args) => {
            let mut overrides = AppConfig::default();
            apply_traversal(&mut overrides, &args.traversal);
            apply_output(&mut overrides, &args.output, cli.no_color);
            let config = resolve_config(explicit, &overrides, quiet)?;
            cli::run_tree(TreeCommand {
                selection: parse_selections(&args.selections)?,
                effectivity: effectivity_context(&args)?,
                store: args.store,
                root: args.root,
                traversal: config.traversal,
                output: config.output,
                quiet,
            })
        }
        Commands::WhereUsed {
            store,
            item,
            recursive,
            max_levels,
            output,
        } => {
            let mut overrides = AppConfig::default();
            apply_output(&mut overrides, &output, cli.no_color);
            let config = resolve_config(explicit, &overrides, quiet)?;
            cli::run_where_used(WhereUsedCommand {
                store,
                item,
                recursive,
                max_levels,
                output: config.output,
                quiet,
            })
        }
        Commands::CheckCycle {
            store,
            parent,
            child,
            output,
        } => {
            let mut overrides = AppConfig::default();
            apply_output(&mut overrides, &output, cli.no_color);
            let config = resolve_config(explicit, &overrides, quiet)?;
            cli::run_check_cycle(CycleCommand {
                store,
                parent,
                child,
                output: config.output,
                quiet,
            })
        }
        Commands::Compare(args) => {
            let mut overrides = AppConfig::default();
            apply_traversal(&mut overrides, &args.traversal);
            apply_output(&mut overrides, &args.output, cli.no_color);
            if let Some(mode) = args.mode {
                overrides.compare.mode = mode;
            }
            overrides.compare.line_key = args.line_key;
            overrides
                .compare
                .include_relationship_props
                .clone_from(&args.props);
            overrides.compare.include_child_fields = args.include_child_fields;
            overrides.compare.include_substitutes = args.traversal.include_substitutes;
            overrides.compare.include_effectivity = args.traversal.include_effectivity;
            overrides.compare.include_unchanged = args.include_unchanged;
            if let Some(tolerance) = args.tolerance {
                overrides.compare.quantity_tolerance = tolerance;
            }
            overrides.filtering.min_severity = args.min_severity;
            overrides.filtering.min_quantity_delta = args.min_quantity_delta;
            overrides.filtering.max_quantity_delta = args.max_quantity_delta;
            if let Some(delimiter) = &args.delimiter {
                overrides.output.delimiter.clone_from(delimiter);
            }
            let config = resolve_config(explicit, &overrides, quiet)?;

            let (left, right) = match &args.store {
                Some(store) => (
                    TreeInput::Store {
                        store: store.clone(),
                        root: args.left,
                    },
                    TreeInput::Store {
                        store: store.clone(),
                        root: args.right,
                    },
                ),
                None => (
                    TreeInput::Snapshot(PathBuf::from(args.left)),
                    TreeInput::Snapshot(PathBuf::from(args.right)),
                ),
            };
            cli::run_compare(CompareCommand {
                left,
                right,
                config,
                delta: args.delta,
                no_fail_on_change: args.no_fail_on_change,
                quiet,
            })
        }
        Commands::Rebase {
            base,
            mine,
            theirs,
            output,
        } => {
            let mut overrides = AppConfig::default();
            apply_output(&mut overrides, &output, cli.no_color);
            let config = resolve_config(explicit, &overrides, quiet)?;
            cli::run_rebase(RebaseCommand {
                base,
                mine,
                theirs,
                output: config.output,
                quiet,
            })
        }
        Commands::ConfigSchema => {
            println!("{}", generate_json_schema()?);
            Ok(exit_codes::SUCCESS)
        }
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "bom-tools", &mut io::stdout());
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    match run(cli) {
        Ok(exit_code) => {
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(exit_codes::ERROR);
        }
    }
}
