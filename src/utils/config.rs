//! Configuration and constants for the CLI.

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

// Output file naming. Stage numbers are 1-based and zero-padded to two
// digits, matching the table files the tool's predecessors produced
// (tbl_cutflow_01.txt, tbl_01_n.smsmass1.smsmass2.ht.txt, ...).
pub const CUTFLOW_FILE_PREFIX: &str = "tbl_cutflow";
pub const TABLE_FILE_PREFIX: &str = "tbl";
pub const SELECTION_SNAPSHOT_PREFIX: &str = "eventselection";
pub const RUN_SUMMARY_FILE: &str = "run_summary.json";

/// Column headers of a cutflow file, one row per selection-tree node
pub const CUTFLOW_COLUMNS: &[&str] = &["depth", "class", "name", "pass", "total"];

/// Summary columns appended after the key columns of a yield table
pub const COUNT_COLUMNS: &[&str] = &["n", "nvar"];

/// Cap on how many per-event failures are logged individually; the rest are
/// only counted, so one corrupt shard cannot flood the log.
pub const MAX_LOGGED_EVENT_FAILURES: u64 = 25;
