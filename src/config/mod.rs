//! Analysis configuration schema.
//!
//! This module defines the declarative structure the tool is driven by: a
//! list of stages, each with a nested selection literal and table specs.
//! The model round-trips losslessly through JSON, which is what makes the
//! per-stage provenance snapshots trustworthy: the file on disk is exactly
//! the configuration that ran, with no re-evaluation needed to inspect it.

use crate::utils::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Top-level analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Derived attributes computed per event before the first stage
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub derive: Vec<DeriveConfig>,

    /// Pipeline stages, applied in order; an event must pass a stage's
    /// selection before the next stage sees it
    pub stages: Vec<StageConfig>,
}

/// One derived attribute: a ratio of two attribute references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeriveConfig {
    /// Name of the attribute to attach
    pub out: String,

    /// (numerator, denominator) attribute references
    pub ratio: (String, String),
}

/// One pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Stage label used in logs and the run summary
    pub name: String,

    /// Selection tree literal
    pub selection: SelectionConfig,

    /// Tables filled from events that pass this stage's selection
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<TableConfig>,
}

/// Nested selection-tree literal.
///
/// Mirrors the configuration dialect of the analysis scripts: a bare string
/// is a cut, `{"All": [...]}` / `{"Any": [...]}` combine children in
/// declared order, `{"Not": ...}` negates a single child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectionConfig {
    All(Vec<SelectionConfig>),
    Any(Vec<SelectionConfig>),
    Not(Box<SelectionConfig>),
    #[serde(untagged)]
    Cut(String),
}

/// One table specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Attribute references to key on (`name` or `name[i]`)
    pub attrs: Vec<String>,

    /// Output column names, one per attribute
    pub columns: Vec<String>,

    /// Binning descriptor per attribute
    pub binnings: Vec<BinningConfig>,

    /// Optional weight attribute; unit weight per event when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
}

/// Binning descriptor, one of the four function variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinningConfig {
    Identity,
    Round { width: f64, max: f64 },
    RoundLog { width: f64, max: f64 },
    Combine { pieces: Vec<CombinePieceConfig> },
}

/// One piece of a combine descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinePieceConfig {
    /// Exclusive upper edge of the values this piece owns; the last piece
    /// omits it and owns everything that remains
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub below: Option<f64>,

    /// Child binning applied within the owned range
    pub bin: BinningConfig,
}

impl AnalysisConfig {
    /// Load from a JSON file
    ///
    /// # Errors
    /// * `ConfigError::Io` - the file cannot be read
    /// * `ConfigError::Json` - the contents do not match the schema
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::open(path.as_ref())?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Parse from a JSON string (tests and embedded defaults)
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}
