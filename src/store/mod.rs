//! Destination database handling.
//!
//! - `sqlite`: connection, pragmas and table lifecycle
//! - `writer`: transactional multi-row inserts with overflow retry
//! - `policy`: batch-size halving

pub mod policy;
pub mod sqlite;
pub mod writer;

pub use policy::BatchPolicy;
pub use sqlite::{JournalMode, Store, StoreConfig};
pub use writer::{is_parameter_overflow, BatchWriter, WriteStats};
