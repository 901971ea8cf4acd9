//! addb2db
//!
//! Loads ADDB trace dumps into a SQLite database so request lifecycles can
//! be reconstructed offline.
//!
//! This crate provides the core implementation for the `addb2db` CLI tool:
//! a registry of record-type transformers, a streaming block reader, a
//! per-table router and a batch writer that shrinks its INSERTs when the
//! engine's parameter limit is hit.
//!
//! ## Getting Started
//!
//! ```bash
//! addb2db ingest --dumps trace_42.txt --db m0play.db
//! addb2db --help
//! ```

pub mod commands;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod store;
pub mod utils;
