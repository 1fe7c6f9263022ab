//! Aligned text-table writers for cutflow and yield tables.
//!
//! Both file kinds share one layout: a header row, then one space-separated
//! row per entry, with every column padded to its widest cell. Numeric
//! columns are right-aligned, name and category columns left-aligned. The
//! row order is deterministic (traversal order for cutflows, lexicographic
//! key order for yield tables) so reruns diff cleanly.

use crate::aggregator::key::format_number;
use crate::aggregator::AggregationTable;
use crate::selection::CutflowReport;
use crate::utils::config::{COUNT_COLUMNS, CUTFLOW_COLUMNS};
use crate::utils::error::OutputError;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One table cell, carrying its alignment
struct Cell {
    text: String,
    right_align: bool,
}

impl Cell {
    fn num(value: impl ToString) -> Self {
        Cell {
            text: value.to_string(),
            right_align: true,
        }
    }

    fn text(value: impl Into<String>) -> Self {
        Cell {
            text: value.into(),
            right_align: false,
        }
    }
}

/// Write a cutflow report: one row per selection-tree node
///
/// **Public** - called per stage after the run
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::InvalidPath` - path cannot be created or is invalid
pub fn write_cutflow(
    report: &CutflowReport,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let rows = report
        .rows()
        .iter()
        .map(|row| {
            vec![
                Cell::num(row.depth),
                Cell::text(row.class.to_string()),
                Cell::text(row.name.clone()),
                Cell::num(row.pass),
                Cell::num(row.total),
            ]
        })
        .collect();
    write_aligned(CUTFLOW_COLUMNS, rows, output_path.as_ref())
}

/// Write one yield table: key columns, then the count columns
///
/// **Public** - called per table spec per stage after the run
pub fn write_table(
    table: &AggregationTable,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let mut headers: Vec<&str> = table.columns().iter().map(String::as_str).collect();
    headers.extend_from_slice(COUNT_COLUMNS);

    let rows = table
        .rows()
        .map(|(key, count)| {
            let mut cells: Vec<Cell> = key
                .iter()
                .map(|atom| match atom {
                    crate::aggregator::KeyAtom::Num(_) => Cell::num(atom),
                    crate::aggregator::KeyAtom::Str(_) => Cell::text(atom.to_string()),
                })
                .collect();
            cells.push(Cell::num(format_number(count.n)));
            cells.push(Cell::num(format_number(count.nvar)));
            cells
        })
        .collect();
    write_aligned(&headers, rows, output_path.as_ref())
}

/// Shared aligned writer
fn write_aligned(headers: &[&str], rows: Vec<Vec<Cell>>, path: &Path) -> Result<(), OutputError> {
    super::validate_output_path(path)?;
    super::prepare_parent(path)?;

    // Column width: the widest of the header and every cell. A column is
    // right-aligned (header included) unless some cell in it is text.
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    let mut right_align: Vec<bool> = vec![true; headers.len()];
    for row in &rows {
        for (column, cell) in row.iter().enumerate() {
            widths[column] = widths[column].max(cell.text.len());
            right_align[column] &= cell.right_align;
        }
    }

    let file = File::create(path).map_err(OutputError::WriteFailed)?;
    let mut writer = BufWriter::new(file);

    let pad = |text: &str, column: usize| {
        if right_align[column] {
            format!("{:>width$}", text, width = widths[column])
        } else {
            format!("{:<width$}", text, width = widths[column])
        }
    };

    let header_line: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(column, h)| pad(h, column))
        .collect();
    writeln!(writer, "{}", header_line.join(" ").trim_end())?;

    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(column, cell)| pad(&cell.text, column))
            .collect();
        writeln!(writer, "{}", line.join(" ").trim_end())?;
    }
    writer.flush()?;

    info!("wrote {}", path.display());
    Ok(())
}
