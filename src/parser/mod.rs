//! Dump record parsing and schema definitions.
//!
//! This module handles:
//! - Tokenizing raw dump lines
//! - Converting tokens to typed values
//! - Dispatching record types to their transformers
//! - Defining the destination schema

pub mod record;
pub mod registry;
pub mod schema;
pub mod values;

// Re-export main types
pub use record::{tokenize, TraceLine};
pub use registry::{EdgeDirection, Registration, Registry, Transformer, RECORD_TYPES};
pub use schema::{AttrRow, RelationRow, RequestRow, Row, RowCounts, S3RequestUidRow, Table};
