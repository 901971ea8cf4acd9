//! Streaming stages between a dump file and the writer.
//!
//! - `reader`: bounded blocks of raw lines
//! - `router`: per-table row batches for one block

pub mod reader;
pub mod router;

pub use reader::{count_lines, BlockReader};
pub use router::{route_block, TableBatches};
