//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod check;
pub mod ingest;
pub mod models;
pub mod progress;
pub mod utils;

// Re-export main command functions
pub use check::{execute_check, print_check_summary, CheckSummary};
pub use ingest::{execute_ingest, parse_pid, validate_args, IngestSummary};
pub use models::{CancelFlag, CheckArgs, IngestArgs};
pub use utils::{display_schema, display_version};
