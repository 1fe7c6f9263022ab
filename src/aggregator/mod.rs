//! Aggregation of selected events into keyed count tables.
//!
//! This module turns surviving events into:
//! - discretized key tuples (one binning function per key column)
//! - per-key count summaries, exportable in a stable order

pub mod key;
pub mod table;

// Re-export main types
pub use key::{Key, KeyAtom};
pub use table::{AggregationTable, Count, KeyBinner};
