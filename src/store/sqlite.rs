//! SQLite destination store.
//!
//! Owns the connection, applies the bulk-load pragmas and manages the four
//! destination tables.

use super::policy::BatchPolicy;
use super::writer::BatchWriter;
use crate::parser::{RowCounts, Table};
use crate::utils::config::DEFAULT_CACHE_SIZE_KIB;
use crate::utils::error::StoreError;
use log::{debug, info};
use rusqlite::limits::Limit;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// SQLite rollback journal mode
///
/// `Off` is the fastest but leaves a failed batch without rollback, so the
/// default is `Memory`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    Off,
    #[default]
    Memory,
    Delete,
    Wal,
}

impl JournalMode {
    /// Value for `PRAGMA journal_mode`
    pub fn pragma_value(self) -> &'static str {
        match self {
            JournalMode::Off => "OFF",
            JournalMode::Memory => "MEMORY",
            JournalMode::Delete => "DELETE",
            JournalMode::Wal => "WAL",
        }
    }
}

/// Connection tuning applied on open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub journal_mode: JournalMode,
    pub cache_size_kib: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            journal_mode: JournalMode::default(),
            cache_size_kib: DEFAULT_CACHE_SIZE_KIB,
        }
    }
}

/// Destination database
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the destination file
    ///
    /// **Public** - main entry point for the store
    ///
    /// # Errors
    /// * `StoreError::Sqlite` - file cannot be opened or pragmas fail
    pub fn open(path: impl AsRef<Path>, config: &StoreConfig) -> Result<Self, StoreError> {
        let path = path.as_ref();
        info!("Opening database: {}", path.display());
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.apply_pragmas(config)?;
        Ok(store)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// **Private** - bulk-load settings
    fn apply_pragmas(&self, config: &StoreConfig) -> Result<(), StoreError> {
        debug!(
            "Applying pragmas: journal_mode={}, cache_size=-{}",
            config.journal_mode.pragma_value(),
            config.cache_size_kib
        );
        self.conn.execute_batch(&format!(
            "PRAGMA journal_mode = {};\nPRAGMA synchronous = OFF;\nPRAGMA cache_size = -{};",
            config.journal_mode.pragma_value(),
            config.cache_size_kib
        ))?;
        Ok(())
    }

    /// Create any missing destination tables, keeping existing rows
    pub fn ensure_tables(&mut self) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        for table in Table::ALL {
            tx.execute_batch(&table.create_sql())?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Drop and recreate all destination tables in one transaction
    pub fn reset(&mut self) -> Result<(), StoreError> {
        info!("Resetting destination tables");
        let tx = self.conn.transaction()?;
        for table in Table::ALL {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS \"{}\"", table.name()))?;
            tx.execute_batch(&table.create_sql())?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Build lookup indexes on correlation columns
    ///
    /// Safe to call repeatedly.
    pub fn create_indexes(&mut self) -> Result<(), StoreError> {
        info!("Creating indexes");
        let tx = self.conn.transaction()?;
        for table in Table::ALL {
            for column in table.indexed_columns() {
                tx.execute_batch(&format!(
                    "CREATE INDEX IF NOT EXISTS \"{t}_{c}\" ON \"{t}\" (\"{c}\")",
                    t = table.name(),
                    c = column
                ))?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Names of indexes currently defined on destination tables
    pub fn index_names(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'index' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Number of rows in `table`
    pub fn row_count(&self, table: Table) -> Result<u64, StoreError> {
        let n: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", table.name()),
            [],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }

    /// Row counts for all destination tables
    pub fn row_counts(&self) -> Result<RowCounts, StoreError> {
        let mut counts = RowCounts::default();
        for table in Table::ALL {
            counts.add(table, self.row_count(table)?);
        }
        Ok(counts)
    }

    /// Batch writer borrowing this store's connection
    pub fn writer(&mut self, policy: BatchPolicy) -> BatchWriter<'_> {
        BatchWriter::new(&mut self.conn, policy)
    }

    /// Lower (or raise) the per-statement parameter ceiling
    ///
    /// Returns the previous ceiling.
    pub fn set_variable_limit(&self, limit: i32) -> i32 {
        self.conn.set_limit(Limit::SQLITE_LIMIT_VARIABLE_NUMBER, limit)
    }

    /// Underlying connection, for ad-hoc queries
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
