//! Event Tally
//!
//! Cutflow selection and binned yield tables for batch event analysis.
//!
//! This crate provides the core implementation for the
//! `event-tally` CLI tool: events stream through a pipeline of selection
//! stages (nested All/Any/Not cut trees with per-node pass/total counters)
//! and the survivors accumulate into multi-dimensional binned count tables.
//!
//! ## Getting Started
//!
//! Most users should use the CLI:
//!
//! ```bash
//! event-tally run --config analysis.json --events events.jsonl --outdir tbl
//! ```

pub mod aggregator;
pub mod binning;
pub mod commands;
pub mod config;
pub mod event;
pub mod output;
pub mod pipeline;
pub mod predicate;
pub mod selection;
pub mod source;
pub mod utils;
