//! Cutflow report extraction.
//!
//! A cutflow is the per-node pass/total picture of a fully evaluated
//! selection tree: one row per node, in the tree's traversal order, showing
//! how many events survived each successive criterion. Extraction only
//! reads counters; it never re-triggers evaluation.

use super::tree::{NodeClass, SelectionTree};

/// One report row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutflowRow {
    /// Nesting depth, root = 0; purely presentational
    pub depth: usize,
    pub class: NodeClass,
    /// Leaf rows carry the original cut text, compound rows their class name
    pub name: String,
    pub pass: u64,
    pub total: u64,
}

/// Flattened, ordered cutflow of one selection tree
#[derive(Debug, Clone, Default)]
pub struct CutflowReport {
    rows: Vec<CutflowRow>,
}

impl CutflowReport {
    pub fn rows(&self) -> &[CutflowRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl SelectionTree {
    /// Extract the cutflow in traversal order
    pub fn cutflow(&self) -> CutflowReport {
        let rows = self
            .node_rows()
            .map(|(depth, class, name, pass, total)| CutflowRow {
                depth,
                class,
                name: name.to_string(),
                pass,
                total,
            })
            .collect();
        CutflowReport { rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectionConfig as Sel;
    use crate::event::Event;

    #[test]
    fn test_rows_in_traversal_order_with_counters() {
        let mut tree = SelectionTree::build(&Sel::All(vec![
            Sel::Cut("ev : ev.x > 5".to_string()),
            Sel::Not(Box::new(Sel::Cut("ev : ev.y > 2".to_string()))),
        ]))
        .unwrap();

        tree.evaluate(&Event::new().with("x", 6.0).with("y", 1.0)).unwrap();
        tree.evaluate(&Event::new().with("x", 3.0).with("y", 1.0)).unwrap();

        let report = tree.cutflow();
        let rows = report.rows();
        assert_eq!(rows.len(), 4);

        assert_eq!(rows[0].class, NodeClass::All);
        assert_eq!(rows[0].name, "All");
        assert_eq!((rows[0].pass, rows[0].total), (1, 2));

        assert_eq!(rows[1].class, NodeClass::Leaf);
        assert_eq!(rows[1].name, "ev : ev.x > 5");
        assert_eq!((rows[1].pass, rows[1].total), (1, 2));

        assert_eq!(rows[2].class, NodeClass::Not);
        assert_eq!(rows[2].depth, 1);
        assert_eq!((rows[2].pass, rows[2].total), (1, 1));

        assert_eq!(rows[3].class, NodeClass::Leaf);
        assert_eq!(rows[3].depth, 2);
        assert_eq!((rows[3].pass, rows[3].total), (0, 1));
    }

    #[test]
    fn test_extraction_does_not_advance_counters() {
        let mut tree = SelectionTree::build(&Sel::Cut("ev : ev.x > 5".to_string())).unwrap();
        tree.evaluate(&Event::new().with("x", 6.0)).unwrap();

        let first = tree.cutflow();
        let second = tree.cutflow();
        assert_eq!(first.rows(), second.rows());
        assert_eq!((first.rows()[0].pass, first.rows()[0].total), (1, 1));
    }
}
