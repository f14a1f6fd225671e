//! A single pattern over a two-triple graph, with and without a constraint.

use crate::e2e_tests::helpers::*;

#[test]
fn test_single_pattern_returns_every_match() {
    let engine = engine();
    let result = run(&engine, &query("?x p ?y"), graph_with("a p b; a p c"), "?x ?y")
        .expect("Query should run");
    assert_eq!(result, rows(&["[a, b]", "[a, c]"]));
}

#[test]
fn test_single_pattern_with_ne_constraint() {
    let engine = engine();
    let query = query("?x p ?y").add_constraint(ne("?y", "c"));
    let result =
        run(&engine, &query, graph_with("a p b; a p c"), "?x ?y").expect("Query should run");
    assert_eq!(result, rows(&["[a, b]"]));
}

#[test]
fn test_single_pattern_with_eq_constraint() {
    let engine = engine();
    let query = query("?x p ?y").add_constraint(eq("?y", "c"));
    let result =
        run(&engine, &query, graph_with("a p b; a p c"), "?y").expect("Query should run");
    assert_eq!(result, rows(&["[c]"]));
}

#[test]
fn test_concrete_pattern_matches_once() {
    let engine = engine();
    let result =
        run(&engine, &query("a p b"), graph_with("a p b; a p c"), "").expect("Query should run");
    assert_eq!(result, rows(&["[]"]));

    let result =
        run(&engine, &query("a p z"), graph_with("a p b; a p c"), "").expect("Query should run");
    assert!(result.is_empty());
}
