//! Check command implementation.
//!
//! Runs dumps through the reader and router without a destination and
//! reports what an ingest would write.

use super::ingest::{parse_failure, parse_pid};
use super::models::CheckArgs;
use crate::parser::{Registry, RowCounts, Table};
use crate::pipeline::{route_block, BlockReader};
use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of a dry run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckSummary {
    pub files: usize,
    pub lines: u64,
    pub skipped: u64,

    /// Rows that would be written per table
    pub rows: RowCounts,

    /// Lines seen per registered record type
    pub hits: BTreeMap<String, u64>,
}

/// Execute the check command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Missing dump files or names without a process id
/// * Malformed records of a registered type
pub fn execute_check(args: &CheckArgs) -> Result<CheckSummary> {
    if args.block_lines == 0 {
        anyhow::bail!("block size must be greater than 0");
    }

    let registry = Registry::new().context("Failed to build record-type registry")?;
    let mut summary = CheckSummary::default();

    for dump in &args.dumps {
        let pid = parse_pid(dump)?;
        info!("Checking {} (pid {})", dump.display(), pid);

        let reader = BlockReader::open(dump, args.block_lines)
            .with_context(|| format!("Failed to open {}", dump.display()))?;

        let mut file_lines = 0u64;
        for block in reader {
            let block = block.with_context(|| format!("Failed to read {}", dump.display()))?;

            let batches = route_block(&block, &registry, pid)
                .map_err(|e| parse_failure(e, dump, file_lines + 1))?;
            for (table, rows) in batches.iter() {
                summary.rows.add(table, rows.len() as u64);
            }
            for (kind, n) in batches.hits() {
                *summary.hits.entry(kind.to_string()).or_default() += *n as u64;
            }
            summary.skipped += batches.skipped() as u64;
            file_lines += block.len() as u64;
        }
        summary.lines += file_lines;

        summary.files += 1;
    }

    debug!("Check finished: {} rows", summary.rows.total());
    Ok(summary)
}

/// Print a check summary for humans
pub fn print_check_summary(summary: &CheckSummary) {
    println!("\n{}", "=".repeat(60));
    println!("CHECK SUMMARY");
    println!("{}", "=".repeat(60));
    println!("Files:   {}", summary.files);
    println!("Lines:   {}", summary.lines);
    println!("Skipped: {}", summary.skipped);
    println!();
    for table in Table::ALL {
        println!("  {:<16} {:>10}", table.name(), summary.rows.get(table));
    }
    if !summary.hits.is_empty() {
        println!();
        println!("Record types:");
        for (kind, n) in &summary.hits {
            println!("  {:<24} {:>10}", kind, n);
        }
    }
    println!("{}", "=".repeat(60));
}
