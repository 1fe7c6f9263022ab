//! Event records and attribute resolution.
//!
//! An event is one unit of input data, exposed purely as a mapping from
//! attribute name to value. How the values were materialized (which file
//! format, which branches) is the event source's business; everything past
//! the source sees only this mapping.

pub mod derive;

pub use derive::RatioDerivation;

use crate::utils::error::{EvalError, PredicateError};
use std::collections::HashMap;
use std::fmt;

/// Value of one event attribute
///
/// **Public** - the value model shared by predicates, binning, and the source
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Numeric scalar
    Num(f64),

    /// Ordered sequence of numeric scalars (per-object branches, indexed
    /// like `ht40[0]` in cut expressions)
    NumSeq(Vec<f64>),

    /// Categorical scalar, e.g. a sample or component name
    Str(String),
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Num(v)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(v: Vec<f64>) -> Self {
        AttrValue::NumSeq(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

/// A single resolved attribute value: numeric or categorical
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Num(f64),
    Str(String),
}

/// One event record
///
/// **Public** - flows through the whole pipeline
#[derive(Debug, Clone, Default)]
pub struct Event {
    attrs: HashMap<String, AttrValue>,
}

impl Event {
    /// Create an empty event
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, replacing any previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.attrs.insert(name.into(), value.into());
    }

    /// Builder-style insert, convenient in tests and examples
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up a raw attribute value
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Number of attributes on this event
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// True if the event carries no attributes
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

/// Reference to an event attribute, optionally indexed: `ht40` or `ht40[0]`
///
/// **Public** - used by predicates, table specs, and derivations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrRef {
    pub name: String,
    pub index: Option<usize>,
}

impl AttrRef {
    /// Create a reference to a scalar attribute
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }

    /// Create a reference to one element of a sequence attribute
    pub fn indexed(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index: Some(index),
        }
    }

    /// Parse `name` or `name[i]` from a table spec or derivation
    ///
    /// # Errors
    /// * `PredicateError::UnexpectedChar` - malformed reference text
    pub fn parse(text: &str) -> Result<Self, PredicateError> {
        let text = text.trim();
        let (name, rest) = split_ident(text)?;
        if rest.is_empty() {
            return Ok(Self::scalar(name));
        }

        // The only thing allowed after the name is a bracketed index.
        let inner = rest
            .strip_prefix('[')
            .and_then(|r| r.strip_suffix(']'))
            .ok_or_else(|| {
                PredicateError::UnexpectedToken {
                    expected: "an index like [0] after the attribute name",
                    found: rest.to_string(),
                }
            })?;
        let index: usize = inner
            .trim()
            .parse()
            .map_err(|_| PredicateError::BadNumber(inner.to_string()))?;
        Ok(Self::indexed(name, index))
    }

    /// Resolve against an event, yielding a numeric or categorical scalar.
    ///
    /// A bare name on a sequence resolves to element 0, the convention of
    /// the source data where per-event branches are length-1 arrays.
    ///
    /// # Errors
    /// * `EvalError::MissingAttribute` - the event has no such attribute
    /// * `EvalError::IndexOutOfRange` - explicit index past the end
    /// * `EvalError::IndexedScalar` - explicit index on a scalar attribute
    pub fn resolve(&self, event: &Event) -> Result<Scalar, EvalError> {
        let value = event
            .get(&self.name)
            .ok_or_else(|| EvalError::MissingAttribute(self.name.clone()))?;

        match (value, self.index) {
            (AttrValue::Num(v), None) => Ok(Scalar::Num(*v)),
            (AttrValue::Num(_), Some(index)) => Err(EvalError::IndexedScalar {
                name: self.name.clone(),
                index,
            }),
            (AttrValue::Str(s), None) => Ok(Scalar::Str(s.clone())),
            (AttrValue::Str(_), Some(index)) => Err(EvalError::IndexedScalar {
                name: self.name.clone(),
                index,
            }),
            (AttrValue::NumSeq(seq), index) => {
                let i = index.unwrap_or(0);
                seq.get(i).copied().map(Scalar::Num).ok_or_else(|| {
                    EvalError::IndexOutOfRange {
                        name: self.name.clone(),
                        index: i,
                        len: seq.len(),
                    }
                })
            }
        }
    }

    /// Resolve to a number, rejecting categorical attributes
    pub fn resolve_num(&self, event: &Event) -> Result<f64, EvalError> {
        match self.resolve(event)? {
            Scalar::Num(v) => Ok(v),
            Scalar::Str(_) => Err(EvalError::NonNumeric(self.name.clone())),
        }
    }
}

impl fmt::Display for AttrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}[{}]", self.name, i),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Split a leading identifier off `text`, returning (identifier, rest)
fn split_ident(text: &str) -> Result<(String, &str), PredicateError> {
    let mut end = 0;
    for (pos, c) in text.char_indices() {
        let ok = if pos == 0 {
            c.is_ascii_alphabetic() || c == '_'
        } else {
            c.is_ascii_alphanumeric() || c == '_'
        };
        if !ok {
            break;
        }
        end = pos + c.len_utf8();
    }
    if end == 0 {
        return Err(PredicateError::UnexpectedChar(
            text.chars().next().unwrap_or(' '),
            0,
        ));
    }
    Ok((text[..end].to_string(), &text[end..]))
}
