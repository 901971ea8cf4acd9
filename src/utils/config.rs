//! Configuration and constants for the CLI.

use super::error::ConfigError;
use crate::store::JournalMode;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Destination schema version reported by `schema` and `version`
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Default destination database file
pub const DEFAULT_DB_PATH: &str = "m0play.db";

/// Lines read from a dump and routed at once
pub const DEFAULT_BLOCK_LINES: usize = 32 << 10;

/// Rows per INSERT statement before any halving
pub const DEFAULT_BATCH_ROWS: usize = 777;

/// Page cache hint in KiB (applied as a negative `cache_size`)
pub const DEFAULT_CACHE_SIZE_KIB: i64 = 256 * 1024;

/// Environment variable consulted for the destination path
pub const DB_ENV_VAR: &str = "ADDB2DB_DB";

/// Optional run configuration loaded from TOML
///
/// Every field is optional; command-line flags take precedence and
/// built-in defaults fill whatever is left.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Destination database path
    pub db: Option<PathBuf>,

    /// Lines per streaming block
    pub block: Option<usize>,

    /// Rows per transaction attempt
    pub batch: Option<usize>,

    /// Keep existing rows instead of resetting the destination
    pub append_db: Option<bool>,

    /// Build lookup indexes after all dumps are ingested
    pub create_indexes: Option<bool>,

    /// SQLite journal mode for the destination
    pub journal_mode: Option<JournalMode>,
}

/// Load a run configuration from a TOML file
///
/// # Errors
/// * `ConfigError::Io` - If file cannot be read
/// * `ConfigError::Toml` - If TOML is invalid or has unknown keys
pub fn load_config(path: impl AsRef<Path>) -> Result<RunConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: RunConfig = toml::from_str(&contents)?;
    Ok(config)
}
