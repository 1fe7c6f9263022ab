//! Selection tree construction and counter-bearing evaluation.
//!
//! The tree is a sum type over {Leaf, All, Any, Not} stored in a flat arena
//! in depth-first pre-order, so node indices double as the reporting order
//! and each node's depth is fixed at construction. Counters live on every
//! node; evaluation itself never touches them — it records a visit log that
//! is committed only when the whole tree evaluated cleanly, so an event
//! whose predicate faults is excluded from every count.

use crate::config::SelectionConfig;
use crate::event::Event;
use crate::predicate::Predicate;
use crate::utils::error::{ConfigError, EvalError};
use log::debug;
use std::fmt;

/// Node class, reported in the cutflow's `class` column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    All,
    Any,
    Not,
    Leaf,
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeClass::All => "All",
            NodeClass::Any => "Any",
            NodeClass::Not => "Not",
            NodeClass::Leaf => "Leaf",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Leaf(Predicate),
    All(Vec<usize>),
    Any(Vec<usize>),
    Not(usize),
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    depth: usize,
    kind: NodeKind,
    pass: u64,
    total: u64,
}

impl Node {
    fn class(&self) -> NodeClass {
        match self.kind {
            NodeKind::Leaf(_) => NodeClass::Leaf,
            NodeKind::All(_) => NodeClass::All,
            NodeKind::Any(_) => NodeClass::Any,
            NodeKind::Not(_) => NodeClass::Not,
        }
    }
}

/// Visit log of one event's evaluation, committed to the counters only
/// when the whole tree evaluated without error
#[derive(Debug, Clone)]
pub struct EvalTrace {
    visits: Vec<(usize, bool)>,
    passed: bool,
}

impl EvalTrace {
    /// Whether the root accepted the event
    pub fn passed(&self) -> bool {
        self.passed
    }
}

/// A selection tree with pass/total counters on every node
///
/// **Public** - one per pipeline stage
#[derive(Debug, Clone)]
pub struct SelectionTree {
    nodes: Vec<Node>,
}

impl SelectionTree {
    /// Build from a nested configuration literal, compiling every cut.
    ///
    /// The structure is fixed for the tree's lifetime; only the counters
    /// mutate afterwards.
    ///
    /// # Errors
    /// * `ConfigError::Predicate` - a cut expression does not parse
    pub fn build(cfg: &SelectionConfig) -> Result<Self, ConfigError> {
        let mut nodes = Vec::new();
        build_node(&mut nodes, cfg, 0)?;
        debug!("built selection tree with {} nodes", nodes.len());
        Ok(Self { nodes })
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always has at least its root
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Evaluate one event and commit the counters.
    ///
    /// # Errors
    /// * `EvalError` - a predicate faulted; no counter on any node moved
    pub fn evaluate(&mut self, event: &Event) -> Result<bool, EvalError> {
        let trace = self.probe(event)?;
        let passed = trace.passed;
        self.commit(&trace);
        Ok(passed)
    }

    /// Evaluate one event without touching any counter, returning the visit
    /// log. Used by the pipeline to keep a multi-stage event atomic: every
    /// stage probes first, and all traces commit together at the end.
    pub fn probe(&self, event: &Event) -> Result<EvalTrace, EvalError> {
        let mut visits = Vec::with_capacity(self.nodes.len());
        let passed = self.eval_node(0, event, &mut visits)?;
        Ok(EvalTrace { visits, passed })
    }

    /// Apply a previously probed visit log to the counters. Each visited
    /// node's total advances by one, its pass by one if it held.
    pub fn commit(&mut self, trace: &EvalTrace) {
        for &(index, held) in &trace.visits {
            let node = &mut self.nodes[index];
            node.total += 1;
            if held {
                node.pass += 1;
            }
        }
    }

    /// Recursive evaluation with short-circuit semantics.
    ///
    /// Children past the short-circuit point are not visited at all, so
    /// their counters do not advance for this event. The reported numbers
    /// therefore read as "events that reached this cut", which is the
    /// contract the cutflow consumers rely on.
    fn eval_node(
        &self,
        index: usize,
        event: &Event,
        visits: &mut Vec<(usize, bool)>,
    ) -> Result<bool, EvalError> {
        let held = match &self.nodes[index].kind {
            NodeKind::Leaf(predicate) => predicate.evaluate(event)?,
            NodeKind::All(children) => {
                // Vacuously true with no children.
                let mut all = true;
                for &child in children {
                    if !self.eval_node(child, event, visits)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            NodeKind::Any(children) => {
                // Vacuously false with no children.
                let mut any = false;
                for &child in children {
                    if self.eval_node(child, event, visits)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            NodeKind::Not(child) => !self.eval_node(*child, event, visits)?,
        };
        visits.push((index, held));
        Ok(held)
    }

    /// Read-only row view in traversal (pre-order) order
    pub(crate) fn node_rows(&self) -> impl Iterator<Item = (usize, NodeClass, &str, u64, u64)> {
        self.nodes
            .iter()
            .map(|node| (node.depth, node.class(), node.name.as_str(), node.pass, node.total))
    }

    /// Root counters, summarized in logs and the run summary
    pub fn root_counts(&self) -> (u64, u64) {
        (self.nodes[0].pass, self.nodes[0].total)
    }
}

/// Push `cfg` and its descendants onto the arena in pre-order, returning
/// the index of the node just built.
fn build_node(
    nodes: &mut Vec<Node>,
    cfg: &SelectionConfig,
    depth: usize,
) -> Result<usize, ConfigError> {
    let index = nodes.len();
    match cfg {
        SelectionConfig::Cut(text) => {
            let predicate =
                Predicate::compile(text).map_err(|source| ConfigError::Predicate {
                    text: text.clone(),
                    source,
                })?;
            nodes.push(Node {
                name: text.clone(),
                depth,
                kind: NodeKind::Leaf(predicate),
                pass: 0,
                total: 0,
            });
        }
        SelectionConfig::All(children) => {
            nodes.push(Node {
                name: "All".to_string(),
                depth,
                kind: NodeKind::All(Vec::new()),
                pass: 0,
                total: 0,
            });
            let ids = build_children(nodes, children, depth + 1)?;
            if let NodeKind::All(slots) = &mut nodes[index].kind {
                *slots = ids;
            }
        }
        SelectionConfig::Any(children) => {
            nodes.push(Node {
                name: "Any".to_string(),
                depth,
                kind: NodeKind::Any(Vec::new()),
                pass: 0,
                total: 0,
            });
            let ids = build_children(nodes, children, depth + 1)?;
            if let NodeKind::Any(slots) = &mut nodes[index].kind {
                *slots = ids;
            }
        }
        SelectionConfig::Not(child) => {
            nodes.push(Node {
                name: "Not".to_string(),
                depth,
                kind: NodeKind::Not(0),
                pass: 0,
                total: 0,
            });
            let child_index = build_node(nodes, child, depth + 1)?;
            if let NodeKind::Not(slot) = &mut nodes[index].kind {
                *slot = child_index;
            }
        }
    }
    Ok(index)
}

fn build_children(
    nodes: &mut Vec<Node>,
    children: &[SelectionConfig],
    depth: usize,
) -> Result<Vec<usize>, ConfigError> {
    let mut ids = Vec::with_capacity(children.len());
    for child in children {
        ids.push(build_node(nodes, child, depth)?);
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectionConfig as Sel;

    fn cut(text: &str) -> Sel {
        Sel::Cut(text.to_string())
    }

    fn counters(tree: &SelectionTree) -> Vec<(u64, u64)> {
        tree.node_rows().map(|(_, _, _, pass, total)| (pass, total)).collect()
    }

    #[test]
    fn test_vacuous_all_is_true() {
        let mut tree = SelectionTree::build(&Sel::All(vec![])).unwrap();
        assert!(tree.evaluate(&Event::new()).unwrap());
        assert_eq!(counters(&tree), vec![(1, 1)]);
    }

    #[test]
    fn test_vacuous_any_is_false() {
        let mut tree = SelectionTree::build(&Sel::Any(vec![])).unwrap();
        assert!(!tree.evaluate(&Event::new()).unwrap());
        assert_eq!(counters(&tree), vec![(0, 1)]);
    }

    #[test]
    fn test_all_short_circuit_skips_later_children() {
        let mut tree = SelectionTree::build(&Sel::All(vec![
            cut("ev : ev.x > 5"),
            cut("ev : ev.y < 2"),
        ]))
        .unwrap();

        // x fails: the y leaf must not be visited at all.
        let event = Event::new().with("x", 4.0).with("y", 1.0);
        assert!(!tree.evaluate(&event).unwrap());
        assert_eq!(counters(&tree), vec![(0, 1), (0, 1), (0, 0)]);
    }

    #[test]
    fn test_any_short_circuit_stops_at_first_pass() {
        let mut tree = SelectionTree::build(&Sel::Any(vec![
            cut("ev : ev.x > 5"),
            cut("ev : ev.y < 2"),
        ]))
        .unwrap();

        let event = Event::new().with("x", 6.0).with("y", 1.0);
        assert!(tree.evaluate(&event).unwrap());
        assert_eq!(counters(&tree), vec![(1, 1), (1, 1), (0, 0)]);
    }

    #[test]
    fn test_not_counts_pass_on_negation() {
        let mut tree =
            SelectionTree::build(&Sel::Not(Box::new(cut("ev : ev.x > 5")))).unwrap();

        let event = Event::new().with("x", 4.0);
        assert!(tree.evaluate(&event).unwrap());
        // Root Not passed (child false); the leaf itself did not.
        assert_eq!(counters(&tree), vec![(1, 1), (0, 1)]);
    }

    #[test]
    fn test_three_event_cutflow_numbers() {
        let mut tree = SelectionTree::build(&Sel::All(vec![
            cut("ev : ev.x > 5"),
            cut("ev : ev.y < 2"),
        ]))
        .unwrap();

        let events = [
            Event::new().with("x", 6.0).with("y", 1.0),
            Event::new().with("x", 4.0).with("y", 1.0),
            Event::new().with("x", 7.0).with("y", 3.0),
        ];
        let survivors: Vec<bool> = events
            .iter()
            .map(|e| tree.evaluate(e).unwrap())
            .collect();

        assert_eq!(survivors, vec![true, false, false]);
        // Root: 1/3. Leaf "x > 5": 2/3. Leaf "y < 2": 1/2 (skipped once).
        assert_eq!(counters(&tree), vec![(1, 3), (2, 3), (1, 2)]);
    }

    #[test]
    fn test_predicate_fault_leaves_no_trace() {
        let mut tree = SelectionTree::build(&Sel::All(vec![
            cut("ev : ev.x > 5"),
            cut("ev : ev.y < 2"),
        ]))
        .unwrap();

        // First leaf passes, second faults: neither may count the event.
        let event = Event::new().with("x", 6.0);
        assert!(tree.evaluate(&event).is_err());
        assert_eq!(counters(&tree), vec![(0, 0), (0, 0), (0, 0)]);

        // A later clean event is counted normally.
        let event = Event::new().with("x", 6.0).with("y", 1.0);
        assert!(tree.evaluate(&event).unwrap());
        assert_eq!(counters(&tree), vec![(1, 1), (1, 1), (1, 1)]);
    }

    #[test]
    fn test_nested_depths_in_preorder() {
        let tree = SelectionTree::build(&Sel::All(vec![
            cut("ev : ev.a > 0"),
            Sel::Any(vec![cut("ev : ev.b > 0"), cut("ev : ev.c > 0")]),
        ]))
        .unwrap();

        let depths: Vec<usize> = tree.node_rows().map(|(depth, ..)| depth).collect();
        assert_eq!(depths, vec![0, 1, 1, 2, 2]);
        let classes: Vec<NodeClass> =
            tree.node_rows().map(|(_, class, ..)| class).collect();
        assert_eq!(
            classes,
            vec![
                NodeClass::All,
                NodeClass::Leaf,
                NodeClass::Any,
                NodeClass::Leaf,
                NodeClass::Leaf
            ]
        );
    }

    #[test]
    fn test_counters_grow_monotonically() {
        let mut tree = SelectionTree::build(&cut("ev : ev.x > 5")).unwrap();
        let mut last = (0, 0);
        for i in 0..10 {
            let event = Event::new().with("x", i as f64);
            tree.evaluate(&event).unwrap();
            let now = tree.root_counts();
            assert!(now.0 >= last.0 && now.1 > last.1);
            assert!(now.0 <= now.1);
            last = now;
        }
        assert_eq!(last, (4, 10));
    }
}
