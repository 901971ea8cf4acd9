//! Output writers for run summaries.
//!
//! This module handles writing data to disk:
//! - JSON run and check summaries

pub mod json;

use crate::utils::error::OutputError;
use std::path::Path;

// Re-export main functions
pub use json::{read_summary, summary_to_string, write_summary};

/// Validate that an output path can be written
///
/// **Public** - shared by every writer that creates a file
///
/// # Errors
/// * `OutputError::InvalidPath` - path is empty or names a directory
pub fn validate_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}
