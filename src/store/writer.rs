//! Adaptive batch writer.
//!
//! All rows of one table batch are written in a single transaction as a
//! series of multi-row INSERTs. If SQLite rejects a statement for binding
//! too many parameters, the transaction is rolled back, the batch size is
//! halved and the whole batch is retried. A batch is therefore either fully
//! visible or absent.

use super::policy::BatchPolicy;
use crate::parser::{Row, RowCounts, Table};
use crate::pipeline::TableBatches;
use crate::utils::error::StoreError;
use log::{debug, warn};
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;

/// Totals reported by a writer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteStats {
    /// Rows committed per table
    pub rows: RowCounts,

    /// Number of overflow retries taken
    pub retries: u64,
}

/// Writes routed batches into the four destination tables
///
/// The batch size starts at the policy's initial value and only ever
/// shrinks; once halved it stays reduced for the rest of the writer's life.
pub struct BatchWriter<'c> {
    conn: &'c mut Connection,
    policy: BatchPolicy,
    size: usize,
    stats: WriteStats,
}

impl<'c> BatchWriter<'c> {
    pub fn new(conn: &'c mut Connection, policy: BatchPolicy) -> Self {
        Self {
            conn,
            policy,
            size: policy.initial(),
            stats: WriteStats::default(),
        }
    }

    /// Current rows-per-INSERT
    pub fn batch_size(&self) -> usize {
        self.size
    }

    /// Totals so far
    pub fn stats(&self) -> &WriteStats {
        &self.stats
    }

    /// Write every row of one table batch atomically
    ///
    /// **Public** - main entry point for a single table
    ///
    /// # Arguments
    /// * `table` - destination table; every row must belong to it
    /// * `rows` - rows in insertion order
    ///
    /// # Returns
    /// Number of rows committed
    ///
    /// # Errors
    /// * `StoreError::BatchExhausted` - halving reached zero
    /// * `StoreError::Sqlite` - any other database failure; nothing from
    ///   this batch is committed
    pub fn write(&mut self, table: Table, rows: &[Row]) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        debug_assert!(rows.iter().all(|row| row.table() == table));

        loop {
            match insert_batch(self.conn, table, rows, self.size) {
                Ok(()) => {
                    debug!(
                        "Committed {} rows into {} (batch size {})",
                        rows.len(),
                        table,
                        self.size
                    );
                    self.stats.rows.add(table, rows.len() as u64);
                    return Ok(rows.len());
                }
                Err(e) if is_parameter_overflow(&e) => {
                    self.stats.retries += 1;
                    let next = self.policy.next_size(self.size).ok_or(
                        StoreError::BatchExhausted {
                            table: table.name(),
                            rows: rows.len(),
                        },
                    )?;
                    warn!(
                        "Too many SQL variables inserting into {} at batch size {}; retrying with {}",
                        table, self.size, next
                    );
                    self.size = next;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Write all non-empty groups of a routed block, in table order
    ///
    /// # Returns
    /// Counts for this block only
    pub fn write_all(&mut self, batches: &TableBatches) -> Result<RowCounts, StoreError> {
        let mut counts = RowCounts::default();
        for (table, rows) in batches.iter() {
            let n = self.write(table, rows)?;
            counts.add(table, n as u64);
        }
        Ok(counts)
    }

    /// Consume the writer and return its totals
    pub fn finish(self) -> WriteStats {
        self.stats
    }
}

/// True if SQLite rejected a statement for binding too many parameters
pub fn is_parameter_overflow(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("too many SQL variables")
    )
}

/// **Private** - one attempt at writing a batch in `size`-row chunks
///
/// Any early return drops the transaction, which rolls it back.
fn insert_batch(
    conn: &mut Connection,
    table: Table,
    rows: &[Row],
    size: usize,
) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    for chunk in rows.chunks(size) {
        let sql = insert_sql(table, chunk.len());
        let mut stmt = tx.prepare_cached(&sql)?;
        stmt.execute(params_from_iter(chunk.iter().flat_map(Row::params)))?;
    }
    tx.commit()
}

/// **Private** - `INSERT INTO "t" ("a", "b") VALUES (?, ?), (?, ?)`
fn insert_sql(table: Table, rows: usize) -> String {
    let columns = table.columns();
    let names: Vec<String> = columns
        .iter()
        .map(|(name, _)| format!("\"{}\"", name))
        .collect();
    let tuple = format!("({})", vec!["?"; columns.len()].join(", "));
    let values = vec![tuple.as_str(); rows].join(", ");
    format!(
        "INSERT INTO \"{}\" ({}) VALUES {}",
        table.name(),
        names.join(", "),
        values
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_sql() {
        assert_eq!(
            insert_sql(Table::S3RequestUid, 2),
            "INSERT INTO \"s3_request_uid\" (\"pid\", \"id\", \"uuid\") VALUES (?, ?, ?), (?, ?, ?)"
        );
    }

    #[test]
    fn test_is_parameter_overflow() {
        let overflow = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(1),
            Some("too many SQL variables".to_string()),
        );
        let other = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(1),
            Some("no such table: relation".to_string()),
        );
        assert!(is_parameter_overflow(&overflow));
        assert!(!is_parameter_overflow(&other));
        assert!(!is_parameter_overflow(&rusqlite::Error::InvalidQuery));
    }
}
