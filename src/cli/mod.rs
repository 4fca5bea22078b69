//! CLI command handlers.
//!
//! Testable handlers invoked by `main.rs`. Each returns the desired exit
//! code; the caller exits the process when it is non-zero.

mod compare;
mod cycle;
mod input;
mod output;
mod rebase;
mod tree;
mod where_used;

pub use compare::{run_compare, CompareCommand};
pub use cycle::{run_check_cycle, CycleCommand};
pub use input::{load_snapshot, load_store, TreeInput};
pub use output::{write_output, OutputTarget};
pub use rebase::{run_rebase, RebaseCommand};
pub use tree::{run_tree, TreeCommand};
pub use where_used::{run_where_used, WhereUsedCommand};

/// Exit codes for CI/CD integration
pub mod exit_codes {
    /// Success: no changes, no cycle, no conflicts
    pub const SUCCESS: i32 = 0;
    /// Changes, a cycle or rebase conflicts were found
    pub const CHANGES_DETECTED: i32 = 1;
    /// An error occurred
    pub const ERROR: i32 = 3;
}
