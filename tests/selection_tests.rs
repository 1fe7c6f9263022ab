use event_tally::config::SelectionConfig;
use event_tally::event::Event;
use event_tally::selection::{NodeClass, SelectionTree};

fn cut(text: &str) -> SelectionConfig {
    SelectionConfig::Cut(text.to_string())
}

fn xy(x: f64, y: f64) -> Event {
    Event::new().with("x", x).with("y", y)
}

#[test]
fn test_vacuous_node_policies() {
    let mut all = SelectionTree::build(&SelectionConfig::All(vec![])).unwrap();
    let mut any = SelectionTree::build(&SelectionConfig::Any(vec![])).unwrap();
    let event = Event::new();

    assert!(all.evaluate(&event).unwrap());
    assert!(!any.evaluate(&event).unwrap());
}

#[test]
fn test_three_event_cutflow_scenario() {
    // All(["x > 5", "y < 2"]) over three events: one survivor, and the
    // second leaf short-circuited once by the first.
    let mut tree = SelectionTree::build(&SelectionConfig::All(vec![
        cut("ev : ev.x > 5"),
        cut("ev : ev.y < 2"),
    ]))
    .unwrap();

    let events = [xy(6.0, 1.0), xy(4.0, 1.0), xy(7.0, 3.0)];
    let survivors: Vec<Event> = events
        .iter()
        .filter(|e| tree.evaluate(e).unwrap())
        .cloned()
        .collect();

    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].get("x"), events[0].get("x"));

    let report = tree.cutflow();
    let rows = report.rows();

    assert_eq!(rows[0].class, NodeClass::All);
    assert_eq!((rows[0].pass, rows[0].total), (1, 3));

    assert_eq!(rows[1].name, "ev : ev.x > 5");
    assert_eq!((rows[1].pass, rows[1].total), (2, 3));

    assert_eq!(rows[2].name, "ev : ev.y < 2");
    assert_eq!((rows[2].pass, rows[2].total), (1, 2));
}

#[test]
fn test_short_circuit_leaves_later_children_untouched() {
    let mut tree = SelectionTree::build(&SelectionConfig::All(vec![
        cut("ev : ev.x > 5"),
        cut("ev : ev.y < 2"),
    ]))
    .unwrap();

    tree.evaluate(&xy(1.0, 1.0)).unwrap();

    let report = tree.cutflow();
    let second_leaf = &report.rows()[2];
    assert_eq!((second_leaf.pass, second_leaf.total), (0, 0));
}

#[test]
fn test_pass_never_exceeds_total_anywhere() {
    let mut tree = SelectionTree::build(&SelectionConfig::All(vec![
        cut("ev : ev.x > 2"),
        SelectionConfig::Any(vec![cut("ev : ev.y < 1"), cut("ev : ev.y > 4")]),
        SelectionConfig::Not(Box::new(cut("ev : ev.x > 8"))),
    ]))
    .unwrap();

    for i in 0..50 {
        let event = xy((i % 11) as f64, (i % 7) as f64);
        tree.evaluate(&event).unwrap();
    }

    for row in tree.cutflow().rows() {
        assert!(row.pass <= row.total, "row '{}' violates pass <= total", row.name);
    }
}

#[test]
fn test_parent_total_counts_events_that_reached_it() {
    // The Any node sits behind a cut that rejects x <= 5, so its total must
    // equal the number of events with x > 5, not the stream size.
    let mut tree = SelectionTree::build(&SelectionConfig::All(vec![
        cut("ev : ev.x > 5"),
        SelectionConfig::Any(vec![cut("ev : ev.y < 2")]),
    ]))
    .unwrap();

    let events = [xy(6.0, 1.0), xy(1.0, 1.0), xy(9.0, 5.0), xy(2.0, 0.0)];
    for e in &events {
        tree.evaluate(e).unwrap();
    }

    let report = tree.cutflow();
    let any_row = report
        .rows()
        .iter()
        .find(|r| r.class == NodeClass::Any)
        .unwrap();
    assert_eq!(any_row.total, 2);
    assert_eq!(any_row.pass, 1);
}

#[test]
fn test_malformed_cut_fails_at_construction() {
    let result = SelectionTree::build(&SelectionConfig::All(vec![cut("ev : ev.x >")]));
    assert!(result.is_err());
}
