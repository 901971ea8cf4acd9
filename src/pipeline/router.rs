//! Route a block of raw lines into per-table row batches.

use crate::parser::{Registry, Row, Table};
use crate::utils::error::ParseError;
use log::debug;
use std::collections::BTreeMap;

/// Rows of one block grouped by destination table
///
/// Order within each table follows the order of lines in the block.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TableBatches {
    groups: BTreeMap<Table, Vec<Row>>,
    hits: BTreeMap<&'static str, usize>,
    skipped: usize,
}

impl TableBatches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row to its table's group
    pub fn push(&mut self, row: Row) {
        self.groups.entry(row.table()).or_default().push(row);
    }

    /// Rows for `table`, empty if none were routed there
    pub fn rows(&self, table: Table) -> &[Row] {
        self.groups.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Non-empty groups in fixed table order
    pub fn iter(&self) -> impl Iterator<Item = (Table, &[Row])> {
        self.groups
            .iter()
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(table, rows)| (*table, rows.as_slice()))
    }

    /// Total rows across all tables
    pub fn total_rows(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Lines matched per registered record type
    pub fn hits(&self) -> &BTreeMap<&'static str, usize> {
        &self.hits
    }

    /// Lines that produced no row (blank or unregistered)
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.total_rows() == 0
    }
}

/// Route one block of lines through the registry
///
/// **Public** - main entry point for the routing stage
///
/// # Arguments
/// * `lines` - raw lines of one block
/// * `registry` - record-type registry
/// * `pid` - process id of the dump the block came from
///
/// # Errors
/// * `ParseError::InBlock` - first registered record that failed to parse,
///   with its offset in `lines`
pub fn route_block<S: AsRef<str>>(
    lines: &[S],
    registry: &Registry,
    pid: i64,
) -> Result<TableBatches, ParseError> {
    let mut batches = TableBatches::new();

    for (offset, line) in lines.iter().enumerate() {
        let routed = registry
            .classify(line.as_ref(), pid)
            .map_err(|source| ParseError::InBlock {
                offset,
                source: Box::new(source),
            })?;
        match routed {
            Some((kind, row)) => {
                *batches.hits.entry(kind).or_default() += 1;
                batches.push(row);
            }
            None => batches.skipped += 1,
        }
    }

    debug!(
        "Routed {} lines: {} rows, {} skipped",
        lines.len(),
        batches.total_rows(),
        batches.skipped
    );

    Ok(batches)
}
