//! Declarative boolean selection with per-node cutflow counters.
//!
//! This module handles:
//! - Building a selection tree from a nested All/Any/Not literal
//! - Counter-bearing, short-circuiting evaluation per event
//! - Extracting the cutflow report

pub mod cutflow;
pub mod tree;

// Re-export main types
pub use cutflow::{CutflowReport, CutflowRow};
pub use tree::{EvalTrace, NodeClass, SelectionTree};
