//! Output writers for cutflow files, yield tables, and JSON artifacts.
//!
//! This module handles writing data to disk in various formats:
//! - aligned text tables (cutflows and yield tables)
//! - JSON (per-stage provenance snapshots, run summary)

pub mod json;
pub mod table;

// Re-export main functions
pub use json::{
    read_selection_snapshot, write_run_summary, write_selection_snapshot,
};
pub use table::{write_cutflow, write_table};

use crate::utils::config::{CUTFLOW_FILE_PREFIX, SELECTION_SNAPSHOT_PREFIX, TABLE_FILE_PREFIX};
use crate::utils::error::OutputError;
use log::debug;
use std::path::Path;

/// File name of a stage's cutflow table; stage numbers are 1-based
pub fn cutflow_file_name(stage_no: usize) -> String {
    format!("{}_{:02}.txt", CUTFLOW_FILE_PREFIX, stage_no)
}

/// File name of one yield table, e.g. `tbl_01_n.smsmass1.smsmass2.ht.txt`
pub fn table_file_name(stage_no: usize, table_name: &str) -> String {
    format!("{}_{:02}_n.{}.txt", TABLE_FILE_PREFIX, stage_no, table_name)
}

/// File name of a stage's selection provenance snapshot
pub fn snapshot_file_name(stage_no: usize) -> String {
    format!("{}_{:02}.json", SELECTION_SNAPSHOT_PREFIX, stage_no)
}

/// Validate that an output path is writable
///
/// **Private (crate)** - shared by the text and JSON writers
pub(crate) fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    // Refuse to overwrite a directory.
    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Create parent directories if needed
///
/// **Private (crate)** - shared by the text and JSON writers
pub(crate) fn prepare_parent(path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() && !parent.as_os_str().is_empty() {
            debug!("creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(cutflow_file_name(1), "tbl_cutflow_01.txt");
        assert_eq!(table_file_name(2, "smsmass1.smsmass2.ht"), "tbl_02_n.smsmass1.smsmass2.ht.txt");
        assert_eq!(snapshot_file_name(1), "eventselection_01.json");
    }

    #[test]
    fn test_validate_output_path_empty() {
        assert!(validate_output_path(Path::new("")).is_err());
    }

    #[test]
    fn test_validate_output_path_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(validate_output_path(temp_dir.path()).is_err());
    }
}
