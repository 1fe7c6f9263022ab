//! Cut predicates compiled from textual expressions.
//!
//! Compilation is a pure, separate step: a cut string is parsed once while
//! the selection tree is built, and the compiled form is evaluated against
//! each event with no further parsing. Evaluation never mutates the event
//! and never depends on sibling cuts.

pub mod parser;

pub use parser::CmpOp;

use crate::event::Event;
use crate::utils::error::{EvalError, PredicateError};
use parser::{Operand, ParsedCut};
use std::fmt;

/// A compiled cut: a pure function of one event to a boolean
///
/// **Public** - the leaf of every selection tree
#[derive(Debug, Clone)]
pub struct Predicate {
    text: String,
    operands: Vec<Operand>,
    ops: Vec<CmpOp>,
}

impl Predicate {
    /// Compile a cut expression like `ev : ev.ht40[0] > 200`
    ///
    /// # Errors
    /// * `PredicateError` - the expression does not parse; this is a
    ///   configuration-time failure, surfaced before any event is read
    pub fn compile(text: &str) -> Result<Self, PredicateError> {
        let ParsedCut { operands, ops, .. } = parser::parse(text)?;
        Ok(Self {
            text: text.to_string(),
            operands,
            ops,
        })
    }

    /// The original expression text, used as the leaf's display name
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Evaluate against one event.
    ///
    /// A chain `a <= b < c` holds when every adjacent pair holds, so the
    /// middle operand is resolved once and reused on both sides.
    pub fn evaluate(&self, event: &Event) -> Result<bool, EvalError> {
        let mut lhs = self.resolve(&self.operands[0], event)?;
        for (op, operand) in self.ops.iter().zip(&self.operands[1..]) {
            let rhs = self.resolve(operand, event)?;
            if !op.apply(lhs, rhs) {
                return Ok(false);
            }
            lhs = rhs;
        }
        Ok(true)
    }

    fn resolve(&self, operand: &Operand, event: &Event) -> Result<f64, EvalError> {
        match operand {
            Operand::Literal(v) => Ok(*v),
            Operand::Attr(attr) => attr.resolve_num(event),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> Event {
        Event::new()
            .with("ht40", vec![250.0])
            .with("alphaT", vec![0.62])
            .with("jet_eta", vec![-1.2, 2.8])
            .with("nJet40", 3.0)
    }

    #[test]
    fn test_simple_threshold() {
        let p = Predicate::compile("ev : ev.ht40[0] > 200").unwrap();
        assert!(p.evaluate(&event()).unwrap());

        let p = Predicate::compile("ev : ev.ht40[0] > 300").unwrap();
        assert!(!p.evaluate(&event()).unwrap());
    }

    #[test]
    fn test_chained_window_cut() {
        let p = Predicate::compile("ev : 200 <= ev.ht40[0] < 250").unwrap();
        assert!(!p.evaluate(&event()).unwrap());

        let p = Predicate::compile("ev : 250 <= ev.ht40[0] < 300").unwrap();
        assert!(p.evaluate(&event()).unwrap());
    }

    #[test]
    fn test_negative_literal_window() {
        let p = Predicate::compile("ev : -2.5 < ev.jet_eta[0] < 2.5").unwrap();
        assert!(p.evaluate(&event()).unwrap());

        let p = Predicate::compile("ev : -2.5 < ev.jet_eta[1] < 2.5").unwrap();
        assert!(!p.evaluate(&event()).unwrap());
    }

    #[test]
    fn test_missing_attribute_is_an_error_not_false() {
        let p = Predicate::compile("ev : ev.met_pt > 100").unwrap();
        assert!(matches!(
            p.evaluate(&event()),
            Err(EvalError::MissingAttribute(_))
        ));
    }

    #[test]
    fn test_nan_fails_closed() {
        let p = Predicate::compile("ev : ev.r < 1.25").unwrap();
        let ev = Event::new().with("r", f64::NAN);
        assert!(!p.evaluate(&ev).unwrap());
    }

    #[test]
    fn test_evaluation_is_pure() {
        let p = Predicate::compile("ev : ev.nJet40 >= 2").unwrap();
        let ev = event();
        let before = ev.clone();
        p.evaluate(&ev).unwrap();
        assert_eq!(ev.get("nJet40"), before.get("nJet40"));
    }
}
