//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while parsing a trace record
///
/// Any of these coming out of a registered transformer is fatal for the run:
/// a known record family that cannot be parsed means the dump is corrupt.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Timestamp too short: '{0}'")]
    TimestampTooShort(String),

    #[error("Invalid timestamp '{value}': {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Timestamp out of nanosecond range: '{0}'")]
    TimestampOutOfRange(String),

    #[error("Invalid integer '{token}': {source}")]
    InvalidInteger {
        token: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("Record '{kind}' has no field at position {position}")]
    MissingField { kind: String, position: usize },

    #[error("Record '{kind}' has no '{key}' entry")]
    MissingKey { kind: String, key: String },

    #[error("Malformed key/value pair '{0}'")]
    InvalidPair(String),

    #[error("Failed to parse record '{line}': {source}")]
    Record {
        line: String,
        #[source]
        source: Box<ParseError>,
    },

    /// A record failed inside a block; `offset` is its 0-based position there
    #[error("Line {} of block: {source}", offset + 1)]
    InBlock {
        offset: usize,
        #[source]
        source: Box<ParseError>,
    },
}

/// Errors raised while building the record-type registry
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Record type '{0}' is registered more than once")]
    Duplicate(String),
}

/// Errors that can occur while talking to the destination database
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cannot insert {rows} rows into '{table}': batch size halved to zero")]
    BatchExhausted { table: &'static str, rows: usize },

    #[error("Batch size must be greater than 0")]
    InvalidBatchSize,
}

/// Errors that can occur while loading run configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Cannot derive process id from file name: {0}")]
    InvalidPid(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

/// Errors that end an ingest run early without being a data problem
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Ingest cancelled while reading {} after {lines} lines", file.display())]
    Cancelled { file: PathBuf, lines: u64 },
}
