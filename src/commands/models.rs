use crate::store::JournalMode;
use crate::utils::config::{DEFAULT_BATCH_ROWS, DEFAULT_BLOCK_LINES, DEFAULT_DB_PATH};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Arguments for the ingest command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct IngestArgs {
    /// Dump files, ingested in the given order
    pub dumps: Vec<PathBuf>,

    /// Destination database path
    pub db: PathBuf,

    /// Lines per streaming block
    pub block_lines: usize,

    /// Maximum rows per INSERT before halving
    pub batch_rows: usize,

    /// Keep existing rows instead of resetting the tables
    pub append_db: bool,

    /// Build lookup indexes once all dumps are in
    pub create_indexes: bool,

    /// SQLite journal mode for the destination
    pub journal_mode: JournalMode,

    /// Optional path for a JSON run summary
    pub summary_json: Option<PathBuf>,

    /// Cooperative stop request
    pub cancel: CancelFlag,
}

impl Default for IngestArgs {
    fn default() -> Self {
        Self {
            dumps: Vec::new(),
            db: PathBuf::from(DEFAULT_DB_PATH),
            block_lines: DEFAULT_BLOCK_LINES,
            batch_rows: DEFAULT_BATCH_ROWS,
            append_db: false,
            create_indexes: false,
            journal_mode: JournalMode::default(),
            summary_json: None,
            cancel: CancelFlag::new(),
        }
    }
}

/// Arguments for the check command
#[derive(Debug, Clone)]
pub struct CheckArgs {
    /// Dump files to scan
    pub dumps: Vec<PathBuf>,

    /// Lines per streaming block
    pub block_lines: usize,

    /// Print the summary as JSON instead of text
    pub json: bool,
}

impl Default for CheckArgs {
    fn default() -> Self {
        Self {
            dumps: Vec::new(),
            block_lines: DEFAULT_BLOCK_LINES,
            json: false,
        }
    }
}

/// Shared stop request, set from a signal handler or another thread
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop before its next block
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Underlying flag, for `signal_hook::flag::register`
    pub fn as_arc(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }
}
