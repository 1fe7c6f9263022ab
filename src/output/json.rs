//! JSON artifact writers.
//!
//! Two artifacts are JSON: the per-stage selection provenance snapshot
//! (the exact configuration that ran, written back out so a later reader
//! never has to re-run anything to know what was applied) and the run
//! summary manifest.

use crate::config::SelectionConfig;
use crate::pipeline::RunSummary;
use crate::utils::error::OutputError;
use log::{debug, info};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Write a stage's selection configuration snapshot
///
/// **Public** - called per stage before events stream
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - path cannot be created or is invalid
pub fn write_selection_snapshot(
    selection: &SelectionConfig,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    write_json(selection, output_path.as_ref())
}

/// Read a snapshot back; the round-trip is lossless by construction
pub fn read_selection_snapshot(
    input_path: impl AsRef<Path>,
) -> Result<SelectionConfig, OutputError> {
    let input_path = input_path.as_ref();
    debug!("reading selection snapshot from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let selection = serde_json::from_reader(BufReader::new(file))
        .map_err(OutputError::SerializationFailed)?;
    Ok(selection)
}

/// Write the run summary manifest
///
/// **Public** - called once at the end of a run
pub fn write_run_summary(
    summary: &RunSummary,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    write_json(summary, output_path.as_ref())
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), OutputError> {
    super::validate_output_path(path)?;
    super::prepare_parent(path)?;

    let file = File::create(path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value).map_err(OutputError::SerializationFailed)?;

    info!("wrote {}", path.display());
    Ok(())
}
