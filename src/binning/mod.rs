//! Binning functions mapping raw attribute values to discretized keys.
//!
//! Every variant is a stateless pure mapping. Construction validates the
//! parameters up front so that `bin` is total over its documented domain;
//! the one documented exception is logarithmic binning of a non-positive
//! value, which is a typed error and never a silent clip to zero.

use crate::aggregator::KeyAtom;
use crate::config::{BinningConfig, CombinePieceConfig};
use crate::event::Scalar;
use crate::utils::error::{BinError, ConfigError};

/// A binning function
///
/// **Public** - one per key column of every table
#[derive(Debug, Clone)]
pub enum BinningFunc {
    /// Pass the value through unchanged (numbers and category strings)
    Identity,

    /// Linear bins: floor to a multiple of `width`, clipped at `max`.
    /// Values above the ceiling land in the overflow bucket keyed `max`.
    Round { width: f64, max: f64 },

    /// Geometric bins: the same floor-and-clip rule in log10 space
    RoundLog { width: f64, max: f64 },

    /// Ordered pieces splicing other binnings over disjoint value ranges,
    /// e.g. fine linear bins at low values, logarithmic bins above
    Combine { pieces: Vec<CombinePiece> },
}

/// One piece of a `Combine`: a child binning owning the values below `below`
/// (the last piece owns everything that remains and has no edge)
#[derive(Debug, Clone)]
pub struct CombinePiece {
    pub below: Option<f64>,
    pub func: BinningFunc,
}

impl BinningFunc {
    /// Build from a configuration descriptor, validating parameters.
    ///
    /// # Errors
    /// * `ConfigError::InvalidWidth` - zero, negative, or non-finite width
    /// * `ConfigError::InvalidCeiling` - non-finite ceiling
    /// * `ConfigError::Combine*` - pieces that do not tile the value range
    pub fn from_config(cfg: &BinningConfig) -> Result<Self, ConfigError> {
        match cfg {
            BinningConfig::Identity => Ok(BinningFunc::Identity),
            BinningConfig::Round { width, max } => {
                validate_round(*width, *max)?;
                Ok(BinningFunc::Round {
                    width: *width,
                    max: *max,
                })
            }
            BinningConfig::RoundLog { width, max } => {
                validate_round(*width, *max)?;
                Ok(BinningFunc::RoundLog {
                    width: *width,
                    max: *max,
                })
            }
            BinningConfig::Combine { pieces } => {
                let pieces = build_combine(pieces)?;
                Ok(BinningFunc::Combine { pieces })
            }
        }
    }

    /// Map one value to its bin key
    ///
    /// # Errors
    /// * `BinError::NonNumeric` - a string reached a numeric binning
    /// * `BinError::NonFinite` - NaN or infinite input to a numeric binning
    /// * `BinError::NonPositive` - non-positive input to `RoundLog`
    pub fn bin(&self, value: &Scalar) -> Result<KeyAtom, BinError> {
        match self {
            BinningFunc::Identity => Ok(match value {
                Scalar::Num(v) => KeyAtom::num(*v),
                Scalar::Str(s) => KeyAtom::Str(s.clone()),
            }),
            BinningFunc::Round { width, max } => {
                let v = numeric(value)?;
                let key = (v / width).floor() * width;
                Ok(KeyAtom::num(key.min(*max)))
            }
            BinningFunc::RoundLog { width, max } => {
                let v = numeric(value)?;
                if v <= 0.0 {
                    return Err(BinError::NonPositive(v));
                }
                let exponent = (v.log10() / width).floor() * width;
                let key = 10f64.powf(exponent);
                Ok(KeyAtom::num(key.min(*max)))
            }
            BinningFunc::Combine { pieces } => {
                let v = numeric(value)?;
                // Construction guarantees the last piece is unbounded, so
                // some piece always applies.
                for piece in pieces {
                    if piece.below.is_none_or(|edge| v < edge) {
                        return piece.func.bin(value);
                    }
                }
                unreachable!("combine pieces validated to cover all values")
            }
        }
    }
}

fn numeric(value: &Scalar) -> Result<f64, BinError> {
    match value {
        Scalar::Num(v) if v.is_finite() => Ok(*v),
        Scalar::Num(v) => Err(BinError::NonFinite(*v)),
        Scalar::Str(_) => Err(BinError::NonNumeric),
    }
}

fn validate_round(width: f64, max: f64) -> Result<(), ConfigError> {
    if !(width.is_finite() && width > 0.0) {
        return Err(ConfigError::InvalidWidth(width));
    }
    if !max.is_finite() {
        return Err(ConfigError::InvalidCeiling(max));
    }
    Ok(())
}

/// Validate and build combine pieces: edges finite and strictly ascending,
/// exactly the last piece unbounded, so the pieces tile the whole range.
fn build_combine(pieces: &[CombinePieceConfig]) -> Result<Vec<CombinePiece>, ConfigError> {
    if pieces.is_empty() {
        return Err(ConfigError::CombineEmpty);
    }

    let mut built = Vec::with_capacity(pieces.len());
    let mut prev_edge: Option<f64> = None;
    let last = pieces.len() - 1;

    for (i, piece) in pieces.iter().enumerate() {
        match piece.below {
            Some(edge) => {
                if i == last {
                    return Err(ConfigError::CombineBoundedTail);
                }
                if !edge.is_finite() {
                    return Err(ConfigError::CombineBadEdge(edge));
                }
                if let Some(prev) = prev_edge {
                    if edge <= prev {
                        return Err(ConfigError::CombineUnordered { prev, edge });
                    }
                }
                prev_edge = Some(edge);
            }
            None => {
                if i != last {
                    return Err(ConfigError::CombineUnboundedPiece);
                }
            }
        }
        built.push(CombinePiece {
            below: piece.below,
            func: BinningFunc::from_config(&piece.bin)?,
        });
    }

    Ok(built)
}
