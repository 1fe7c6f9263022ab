//! Derived attributes computed before selection.
//!
//! The source data sometimes lacks a quantity the cuts need, but carries its
//! ingredients; a derivation fills the gap per event, before the first
//! selection stage sees it. The one derivation in use is a ratio of two
//! attributes (e.g. missing-HT over missing-ET).

use super::{AttrRef, AttrValue, Event};
use crate::utils::error::EvalError;

/// Ratio of two event attributes, stored under a new name
///
/// **Public** - built by the pipeline from the `derive` configuration list
#[derive(Debug, Clone)]
pub struct RatioDerivation {
    out: String,
    numerator: AttrRef,
    denominator: AttrRef,
}

impl RatioDerivation {
    pub fn new(out: impl Into<String>, numerator: AttrRef, denominator: AttrRef) -> Self {
        Self {
            out: out.into(),
            numerator,
            denominator,
        }
    }

    /// Name of the attribute this derivation adds
    pub fn out_name(&self) -> &str {
        &self.out
    }

    /// Compute the ratio and attach it to the event.
    ///
    /// Division follows IEEE-754: a zero denominator yields an infinity (or
    /// NaN for 0/0), which then fails any later comparison or binning for
    /// this event instead of being patched up here.
    pub fn apply(&self, event: &mut Event) -> Result<(), EvalError> {
        let num = self.numerator.resolve_num(event)?;
        let den = self.denominator.resolve_num(event)?;
        event.insert(self.out.clone(), AttrValue::Num(num / den));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_attached_under_new_name() {
        let d = RatioDerivation::new(
            "MhtOverMet",
            AttrRef::scalar("mht40_pt"),
            AttrRef::scalar("met_pt"),
        );
        let mut ev = Event::new().with("mht40_pt", 130.0).with("met_pt", 104.0);
        d.apply(&mut ev).unwrap();
        assert_eq!(ev.get("MhtOverMet"), Some(&AttrValue::Num(1.25)));
    }

    #[test]
    fn test_ratio_by_zero_is_infinite_not_an_error() {
        let d = RatioDerivation::new("r", AttrRef::scalar("a"), AttrRef::scalar("b"));
        let mut ev = Event::new().with("a", 2.0).with("b", 0.0);
        d.apply(&mut ev).unwrap();
        match ev.get("r") {
            Some(AttrValue::Num(v)) => assert!(v.is_infinite()),
            other => panic!("unexpected value: {:?}", other),
        }
    }

    #[test]
    fn test_ratio_missing_ingredient_is_an_error() {
        let d = RatioDerivation::new("r", AttrRef::scalar("a"), AttrRef::scalar("b"));
        let mut ev = Event::new().with("a", 2.0);
        assert!(d.apply(&mut ev).is_err());
    }
}
