//! Ingest command implementation.
//!
//! The ingest command:
//! 1. Validates arguments and inputs
//! 2. Opens the destination and resets or extends its tables
//! 3. Streams each dump block by block through the router and writer
//! 4. Optionally builds lookup indexes
//! 5. Reports (and optionally writes) a run summary

use super::models::IngestArgs;
use super::progress::Progress;
use crate::output::write_summary;
use crate::parser::{Registry, RowCounts};
use crate::pipeline::{count_lines, route_block, BlockReader};
use crate::store::{BatchPolicy, Store, StoreConfig};
use crate::utils::error::{ConfigError, IngestError, ParseError};
use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Outcome of an ingest run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestSummary {
    /// Destination database
    pub db: PathBuf,

    /// Dump files ingested
    pub files: usize,

    /// Lines read across all dumps
    pub lines: u64,

    /// Lines that produced no row
    pub skipped: u64,

    /// Rows committed per table
    pub rows: RowCounts,

    /// Batch retries after parameter overflow
    pub retries: u64,

    /// Rows-per-INSERT in effect at the end of the run
    pub final_batch_rows: usize,

    /// Wall-clock duration in seconds
    pub elapsed_secs: f64,

    /// RFC 3339 completion time
    pub generated_at: String,
}

/// Execute the ingest command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `args` - Ingest command arguments
///
/// # Returns
/// Summary of what was written
///
/// # Errors
/// * Invalid arguments or missing dump files
/// * Dump file names without a process id
/// * Malformed records of a registered type (fatal)
/// * Database failures, including batch exhaustion
/// * `IngestError::Cancelled` if the cancel flag was raised
pub fn execute_ingest(args: IngestArgs) -> Result<IngestSummary> {
    let start_time = Instant::now();

    validate_args(&args)?;

    let mut summary = IngestSummary {
        db: args.db.clone(),
        final_batch_rows: args.batch_rows,
        ..Default::default()
    };

    if args.dumps.is_empty() {
        info!("No dump files given; nothing to do");
        return Ok(finish(summary, start_time));
    }

    let registry = Registry::new().context("Failed to build record-type registry")?;
    debug!("Registry holds {} record types", registry.len());

    let policy = BatchPolicy::new(args.batch_rows)?;
    let config = StoreConfig {
        journal_mode: args.journal_mode,
        ..Default::default()
    };
    let mut store = Store::open(&args.db, &config)
        .with_context(|| format!("Failed to open database {}", args.db.display()))?;

    if args.append_db {
        info!("Appending to existing tables");
        store.ensure_tables().context("Failed to create tables")?;
    } else {
        store.reset().context("Failed to reset tables")?;
    }

    let total_files = args.dumps.len();
    let mut writer = store.writer(policy);

    for (nr, dump) in args.dumps.iter().enumerate() {
        let pid = parse_pid(dump)?;
        let total_lines = count_lines(dump)
            .with_context(|| format!("Failed to read {}", dump.display()))?;
        info!(
            "{}/{} Reading {} (pid {}, {} lines)",
            nr + 1,
            total_files,
            dump.display(),
            pid,
            total_lines
        );

        let mut progress = Progress::new(dump, total_lines);
        let reader = BlockReader::open(dump, args.block_lines)
            .with_context(|| format!("Failed to open {}", dump.display()))?;

        for block in reader {
            if args.cancel.is_cancelled() {
                return Err(IngestError::Cancelled {
                    file: dump.clone(),
                    lines: summary.lines + progress.done(),
                }
                .into());
            }

            let block = block.with_context(|| format!("Failed to read {}", dump.display()))?;
            let batches = route_block(&block, &registry, pid)
                .map_err(|e| parse_failure(e, dump, progress.done() + 1))?;
            writer
                .write_all(&batches)
                .with_context(|| format!("Failed to write rows from {}", dump.display()))?;

            summary.skipped += batches.skipped() as u64;
            progress.advance(block.len() as u64);
        }

        summary.lines += progress.done();
        summary.files += 1;
    }

    summary.final_batch_rows = writer.batch_size();
    let stats = writer.finish();
    summary.rows = stats.rows;
    summary.retries = stats.retries;

    if args.create_indexes {
        store.create_indexes().context("Failed to create indexes")?;
    }

    let summary = finish(summary, start_time);
    info!(
        "Ingested {} files, {} lines, {} rows in {:.2}s",
        summary.files,
        summary.lines,
        summary.rows.total(),
        summary.elapsed_secs
    );

    if let Some(path) = &args.summary_json {
        write_summary(&summary, path).context("Failed to write run summary")?;
        info!("✓ Summary written to: {}", path.display());
    }

    Ok(summary)
}

/// **Private** - stamp duration and completion time
fn finish(mut summary: IngestSummary, start_time: Instant) -> IngestSummary {
    summary.elapsed_secs = start_time.elapsed().as_secs_f64();
    summary.generated_at = chrono::Utc::now().to_rfc3339();
    summary
}

/// Attach the dump name and 1-based line number to a routing failure
///
/// **Public** - shared with the check command
///
/// # Arguments
/// * `err` - error returned by `route_block`
/// * `dump` - file the block came from
/// * `first_line` - line number of the block's first line
pub fn parse_failure(err: ParseError, dump: &Path, first_line: u64) -> anyhow::Error {
    let line = match &err {
        ParseError::InBlock { offset, .. } => first_line + *offset as u64,
        _ => first_line,
    };
    anyhow::Error::new(err).context(format!(
        "Failed to parse {} at line {}",
        dump.display(),
        line
    ))
}

/// Validate ingest arguments
///
/// **Public** - can be called before execute_ingest for early validation
///
/// # Arguments
/// * `args` - Arguments to validate
///
/// # Returns
/// Ok if arguments are valid, Err with message if not
pub fn validate_args(args: &IngestArgs) -> Result<()> {
    if args.block_lines == 0 {
        anyhow::bail!("block size must be greater than 0");
    }

    if args.batch_rows == 0 {
        anyhow::bail!("batch size must be greater than 0");
    }

    if args.db.as_os_str().is_empty() {
        anyhow::bail!("database path cannot be empty");
    }

    if args.db.is_dir() {
        anyhow::bail!("database path is a directory: {}", args.db.display());
    }

    for dump in &args.dumps {
        if !dump.is_file() {
            anyhow::bail!("dump file not found: {}", dump.display());
        }
        parse_pid(dump)?;
    }

    Ok(())
}

/// Derive the process id from a dump file name
///
/// **Public** - exposed for tests and the check command
///
/// The base name is cut at its first `.`, and the last `_`-separated part
/// is read as decimal when it is all digits, hexadecimal (optionally
/// `0x`-prefixed) otherwise: `dumps/m0trace_42.txt` is 42, `addb_1f.dump`
/// and `addb_0x1f.dump` are 31.
///
/// # Errors
/// * `ConfigError::InvalidPid` - no usable id in the name
pub fn parse_pid(path: impl AsRef<Path>) -> Result<i64, ConfigError> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ConfigError::InvalidPid(path.display().to_string()))?;

    let stem = name.split('.').next().unwrap_or(name);
    let id = stem.rsplit('_').next().unwrap_or(stem);

    let parsed = if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        id.parse::<i64>().ok()
    } else {
        let digits = id
            .strip_prefix("0x")
            .or_else(|| id.strip_prefix("0X"))
            .unwrap_or(id);
        i64::from_str_radix(digits, 16).ok()
    };

    parsed.ok_or_else(|| ConfigError::InvalidPid(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pid_decimal() {
        assert_eq!(parse_pid("dumps/trace_42.txt").unwrap(), 42);
        assert_eq!(parse_pid("/tmp/m0play_host_1234.dump.gz").unwrap(), 1234);
        assert_eq!(parse_pid("7").unwrap(), 7);
    }

    #[test]
    fn test_parse_pid_hex() {
        assert_eq!(parse_pid("addb_1f.txt").unwrap(), 31);
        assert_eq!(parse_pid("dump_ff").unwrap(), 255);
        assert_eq!(parse_pid("trace_0x1f.txt").unwrap(), 31);
        assert_eq!(parse_pid("trace_0XFF.txt").unwrap(), 255);
    }

    #[test]
    fn test_parse_pid_invalid() {
        assert!(matches!(
            parse_pid("trace_xyz.txt"),
            Err(ConfigError::InvalidPid(_))
        ));
        assert!(matches!(parse_pid("trace_.txt"), Err(ConfigError::InvalidPid(_))));
        assert!(matches!(parse_pid(".hidden"), Err(ConfigError::InvalidPid(_))));
    }

    #[test]
    fn test_parse_failure_reports_absolute_line() {
        let err = ParseError::InBlock {
            offset: 3,
            source: Box::new(ParseError::TimestampTooShort("2020-11-10".to_string())),
        };
        let message = format!("{:#}", parse_failure(err, Path::new("trace_5.txt"), 101));
        assert!(message.starts_with("Failed to parse trace_5.txt at line 104"), "{}", message);
    }

    #[test]
    fn test_validate_args_zero_sizes() {
        let args = IngestArgs {
            block_lines: 0,
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());

        let args = IngestArgs {
            batch_rows: 0,
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_missing_dump() {
        let args = IngestArgs {
            dumps: vec![PathBuf::from("/nonexistent/trace_1.txt")],
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_bad_name_rejected_before_destination_is_touched() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("trace_1.txt");
        let bad = dir.path().join("trace_zz.txt");
        std::fs::write(&good, "").unwrap();
        std::fs::write(&bad, "").unwrap();
        let db = dir.path().join("m0play.db");

        let args = IngestArgs {
            dumps: vec![good, bad],
            db: db.clone(),
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
        assert!(execute_ingest(args).is_err());
        assert!(!db.exists());
    }

    #[test]
    fn test_validate_args_db_is_directory() {
        let dir = tempfile::tempdir().unwrap();
        let args = IngestArgs {
            db: dir.path().to_path_buf(),
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_empty_dump_list_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("m0play.db");
        let args = IngestArgs {
            db: db.clone(),
            ..Default::default()
        };

        let summary = execute_ingest(args).unwrap();
        assert_eq!(summary.files, 0);
        assert_eq!(summary.rows.total(), 0);
        assert!(!db.exists());
    }
}
