//! Keyed aggregation of selected events into count summaries.
//!
//! A table turns each surviving event into a discretized key tuple and
//! accumulates a count summary per key. Insertion order never matters: for a
//! fixed set of events the final mapping is identical however the stream was
//! ordered, which is what makes per-shard tables mergeable downstream.

use super::key::{Key, KeyAtom};
use crate::binning::BinningFunc;
use crate::config::TableConfig;
use crate::event::{AttrRef, Event};
use crate::utils::error::{ConfigError, EvalError};
use log::debug;
use std::collections::BTreeMap;

/// Positional application of binning functions to attribute values
///
/// **Public** - turns one event into one table key
#[derive(Debug, Clone)]
pub struct KeyBinner {
    attrs: Vec<AttrRef>,
    binnings: Vec<BinningFunc>,
}

impl KeyBinner {
    /// The attribute list and the binning list must pair up one-to-one.
    pub fn new(attrs: Vec<AttrRef>, binnings: Vec<BinningFunc>) -> Result<Self, ConfigError> {
        if attrs.len() != binnings.len() {
            return Err(ConfigError::KeyShape {
                attrs: attrs.len(),
                binnings: binnings.len(),
            });
        }
        Ok(Self { attrs, binnings })
    }

    /// Resolve and bin each position independently; the key is simply the
    /// tuple of per-position results, never a joint binning.
    pub fn bin(&self, event: &Event) -> Result<Key, EvalError> {
        self.attrs
            .iter()
            .zip(&self.binnings)
            .map(|(attr, func)| {
                let value = attr.resolve(event)?;
                func.bin(&value).map_err(|source| EvalError::Binning {
                    attr: attr.to_string(),
                    source,
                })
            })
            .collect()
    }

    /// Number of key positions
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// True for the (degenerate) zero-column binner
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

/// Count summary accumulated per key: sum of weights and of squared weights.
/// With unit weights `n` is the plain event count and `nvar` equals it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Count {
    pub n: f64,
    pub nvar: f64,
}

impl Count {
    pub fn add(&mut self, weight: f64) {
        self.n += weight;
        self.nvar += weight * weight;
    }
}

/// One aggregation table: key columns, binner, and accumulated counts
///
/// **Public** - one per table spec per stage
#[derive(Debug, Clone)]
pub struct AggregationTable {
    name: String,
    columns: Vec<String>,
    binner: KeyBinner,
    weight: Option<AttrRef>,
    counts: BTreeMap<Key, Count>,
}

impl AggregationTable {
    /// Build an empty table; all three lists must have the same length.
    pub fn new(
        columns: Vec<String>,
        attrs: Vec<AttrRef>,
        binnings: Vec<BinningFunc>,
        weight: Option<AttrRef>,
    ) -> Result<Self, ConfigError> {
        let name = columns.join(".");
        if columns.len() != attrs.len() || columns.len() != binnings.len() {
            return Err(ConfigError::TableShape {
                name,
                attrs: attrs.len(),
                columns: columns.len(),
                binnings: binnings.len(),
            });
        }
        let binner = KeyBinner::new(attrs, binnings)?;
        Ok(Self {
            name,
            columns,
            binner,
            weight,
            counts: BTreeMap::new(),
        })
    }

    /// Build from a table configuration entry
    ///
    /// # Errors
    /// * `ConfigError::AttrRef` - malformed attribute reference text
    /// * `ConfigError::TableShape` - list lengths that do not match
    /// * construction errors from the binning descriptors
    pub fn from_config(cfg: &TableConfig) -> Result<Self, ConfigError> {
        let attrs = cfg
            .attrs
            .iter()
            .map(|text| parse_attr(text))
            .collect::<Result<Vec<_>, _>>()?;
        let binnings = cfg
            .binnings
            .iter()
            .map(BinningFunc::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        let weight = cfg.weight.as_deref().map(parse_attr).transpose()?;
        Self::new(cfg.columns.clone(), attrs, binnings, weight)
    }

    /// Dotted column names, used for display and output file naming
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key column names, in key order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Bin one event without touching the accumulated counts
    pub fn prepare(&self, event: &Event) -> Result<(Key, f64), EvalError> {
        let key = self.binner.bin(event)?;
        let weight = match &self.weight {
            Some(attr) => attr.resolve_num(event)?,
            None => 1.0,
        };
        Ok((key, weight))
    }

    /// Accumulate a previously prepared key/weight pair
    pub fn record(&mut self, key: Key, weight: f64) {
        self.counts.entry(key).or_default().add(weight);
    }

    /// Bin one surviving event and accumulate it
    ///
    /// # Errors
    /// * `EvalError` - attribute resolution or binning failed; the table is
    ///   left untouched for this event
    pub fn fill(&mut self, event: &Event) -> Result<(), EvalError> {
        let (key, weight) = self.prepare(event)?;
        self.record(key, weight);
        Ok(())
    }

    /// Number of distinct keys observed so far
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// True before the first fill
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Accumulated counts keyed by binned tuple
    pub fn counts(&self) -> &BTreeMap<Key, Count> {
        &self.counts
    }

    /// Export rows in lexicographic key order: `(key atoms..., count)`.
    /// The ordered map makes the output deterministic without a sort, so
    /// reruns over the same events diff cleanly.
    pub fn rows(&self) -> impl Iterator<Item = (&Key, &Count)> {
        debug!("exporting table '{}' with {} keys", self.name, self.counts.len());
        self.counts.iter()
    }
}

fn parse_attr(text: &str) -> Result<AttrRef, ConfigError> {
    AttrRef::parse(text).map_err(|source| ConfigError::AttrRef {
        text: text.to_string(),
        source,
    })
}
