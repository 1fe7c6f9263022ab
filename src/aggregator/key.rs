//! Table keys: ordered tuples of binned atoms.
//!
//! A key atom is either a binned number or a category string. Atoms carry a
//! total order (numbers before strings, numbers by `total_cmp`) so keys can
//! live in an ordered map and export in a stable lexicographic order.

use std::cmp::Ordering;
use std::fmt;

/// One position of a table key
#[derive(Debug, Clone)]
pub enum KeyAtom {
    Num(f64),
    Str(String),
}

impl KeyAtom {
    /// Numeric atom. Adds +0.0 so that -0.0 and 0.0 collapse into the same
    /// bin key (they compare unequal under `total_cmp`).
    pub fn num(v: f64) -> Self {
        KeyAtom::Num(v + 0.0)
    }
}

impl PartialEq for KeyAtom {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyAtom {}

impl Ord for KeyAtom {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyAtom::Num(a), KeyAtom::Num(b)) => a.total_cmp(b),
            (KeyAtom::Str(a), KeyAtom::Str(b)) => a.cmp(b),
            (KeyAtom::Num(_), KeyAtom::Str(_)) => Ordering::Less,
            (KeyAtom::Str(_), KeyAtom::Num(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for KeyAtom {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for KeyAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAtom::Num(v) => write!(f, "{}", format_number(*v)),
            KeyAtom::Str(s) => write!(f, "{}", s),
        }
    }
}

/// A full table key: one atom per key column
pub type Key = Vec<KeyAtom>;

/// Format a number the way table files expect: integral values print without
/// a decimal point so reruns diff cleanly (`100`, not `100.0`).
pub(crate) fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_zero_collapses() {
        assert_eq!(KeyAtom::num(-0.0), KeyAtom::num(0.0));
    }

    #[test]
    fn test_numeric_ordering() {
        let mut atoms = vec![KeyAtom::num(10.0), KeyAtom::num(-5.0), KeyAtom::num(0.0)];
        atoms.sort();
        assert_eq!(
            atoms,
            vec![KeyAtom::num(-5.0), KeyAtom::num(0.0), KeyAtom::num(10.0)]
        );
    }

    #[test]
    fn test_numbers_sort_before_strings() {
        let mut atoms = vec![KeyAtom::Str("A".to_string()), KeyAtom::num(1.0)];
        atoms.sort();
        assert!(matches!(atoms[0], KeyAtom::Num(_)));
    }

    #[test]
    fn test_display_integral_without_decimal_point() {
        assert_eq!(KeyAtom::num(100.0).to_string(), "100");
        assert_eq!(KeyAtom::num(-10.0).to_string(), "-10");
        assert_eq!(KeyAtom::num(0.25).to_string(), "0.25");
        assert_eq!(KeyAtom::Str("SMS-T2bb".to_string()).to_string(), "SMS-T2bb");
    }

    #[test]
    fn test_key_lexicographic_order() {
        let a = vec![KeyAtom::num(100.0), KeyAtom::num(0.0)];
        let b = vec![KeyAtom::num(100.0), KeyAtom::num(10.0)];
        let c = vec![KeyAtom::num(200.0), KeyAtom::num(0.0)];
        assert!(a < b && b < c);
    }
}
