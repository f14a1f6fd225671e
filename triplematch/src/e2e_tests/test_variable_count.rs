//! Slot counting across patterns, outputs and blocks.

use crate::e2e_tests::helpers::*;
use crate::graph::{GraphArgs, Triple, terms};
use crate::query::Query;

#[test]
fn test_variable_count_cases() {
    let engine = engine();
    let args = GraphArgs::single(graph_with("a R b"));
    let cases = [
        ("?x R ?x", "", 1),
        ("?x R ?y", "", 2),
        ("?x R ?y", "?y ?x", 2),
        ("?x R y", "?z", 2),
        ("?x R ?y; ?y R ?z", "?x", 3),
        ("?x ?? ?y", "", 2),
        ("a R b", "", 0),
    ];
    for (patterns, outputs, expected) in cases {
        let plan = engine
            .prepare(&query(patterns), &args, &terms(outputs))
            .expect("Query should prepare");
        assert_eq!(plan.variable_count(), expected, "{patterns} / {outputs}");
    }
}

#[test]
fn test_variable_count_across_blocks() {
    let engine = engine();
    let args = GraphArgs::single(graph_with("a R b"));
    let query = Query::new()
        .add_match_triple(Triple::parse("?x R ?y").expect("triple"))
        .add_named_match("other", Triple::parse("?y R ?z").expect("triple"));
    let plan = engine.prepare(&query, &args, &[]).expect("Query should prepare");
    assert_eq!(plan.variable_count(), 3);
    assert_eq!(plan.block_order().len(), 2);

    let results = engine
        .execute_bindings_in(&query, &args, &[])
        .expect("Query should start");
    assert_eq!(results.variable_count(), 3);
}
