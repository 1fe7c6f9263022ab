//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur while parsing a cut expression
#[derive(Error, Debug)]
pub enum PredicateError {
    #[error("expected a binding prefix like `ev :` at the start of the expression")]
    MissingBinding,

    #[error("unexpected character '{0}' at byte {1}")]
    UnexpectedChar(char, usize),

    #[error("invalid numeric literal '{0}'")]
    BadNumber(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("expected {expected}, found '{found}'")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },

    #[error("expression contains no comparison")]
    NoComparison,

    #[error("unknown identifier '{0}' (only the bound event identifier may appear)")]
    UnknownBinding(String),
}

/// Errors that can occur while loading or building an analysis configuration.
///
/// All of these are fatal before any event is processed; a half-built
/// pipeline must never start consuming the stream.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid cut '{text}': {source}")]
    Predicate {
        text: String,
        #[source]
        source: PredicateError,
    },

    #[error("invalid attribute reference '{text}': {source}")]
    AttrRef {
        text: String,
        #[source]
        source: PredicateError,
    },

    #[error("{attrs} key attributes but {binnings} binning functions; the lists must pair up")]
    KeyShape { attrs: usize, binnings: usize },

    #[error(
        "table '{name}': {attrs} attributes, {columns} output columns, {binnings} binnings; the lengths must match"
    )]
    TableShape {
        name: String,
        attrs: usize,
        columns: usize,
        binnings: usize,
    },

    #[error("binning width must be positive and finite, got {0}")]
    InvalidWidth(f64),

    #[error("binning ceiling must be finite, got {0}")]
    InvalidCeiling(f64),

    #[error("combine binning must have at least one piece")]
    CombineEmpty,

    #[error("combine edge {edge} does not increase over the previous edge {prev}")]
    CombineUnordered { prev: f64, edge: f64 },

    #[error("combine edge must be finite, got {0}")]
    CombineBadEdge(f64),

    #[error("every combine piece except the last must declare an upper edge")]
    CombineUnboundedPiece,

    #[error("the last combine piece must be unbounded so the pieces cover all values")]
    CombineBoundedTail,

    #[error("configuration declares no stages")]
    NoStages,
}

/// Errors that can occur while binning one value.
///
/// `NonPositive` is the documented RoundLog error: a non-positive value has
/// no logarithm and must never be coerced to a zero or negative bin.
#[derive(Error, Debug)]
pub enum BinError {
    #[error("value is not numeric")]
    NonNumeric,

    #[error("logarithmic binning requires a positive value, got {0}")]
    NonPositive(f64),

    #[error("cannot bin non-finite value {0}")]
    NonFinite(f64),
}

/// Errors that can occur while evaluating one event.
///
/// These abort the event, not the run: the event is excluded from every
/// counter and table, and the occurrence is surfaced to the caller.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("event has no attribute '{0}'")]
    MissingAttribute(String),

    #[error("index {index} out of range for attribute '{name}' (length {len})")]
    IndexOutOfRange {
        name: String,
        index: usize,
        len: usize,
    },

    #[error("attribute '{name}' is a scalar but was indexed with [{index}]")]
    IndexedScalar { name: String, index: usize },

    #[error("attribute '{0}' is not numeric")]
    NonNumeric(String),

    #[error("cannot bin attribute '{attr}': {source}")]
    Binning {
        attr: String,
        #[source]
        source: BinError,
    },
}

/// Errors that can occur while reading the event stream
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to read events file: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: invalid event JSON: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: an event must be a JSON object")]
    NotAnObject { line: usize },

    #[error("line {line}: attribute '{name}' has an unsupported value type")]
    BadValue { line: usize, name: String },
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("invalid output path: {0}")]
    InvalidPath(String),
}
