//! Two patterns joined through a shared variable.

use crate::e2e_tests::helpers::*;

#[test]
fn test_join_through_shared_variable() {
    let engine = engine();
    let result = run(
        &engine,
        &query("?x p ?y; ?y q ?z"),
        graph_with("a p b; b q c"),
        "?x ?y ?z",
    )
    .expect("Query should run");
    assert_eq!(result, rows(&["[a, b, c]"]));
}

#[test]
fn test_join_without_second_triple_is_empty() {
    let engine = engine();
    let result = run(&engine, &query("?x p ?y; ?y q ?z"), graph_with("a p b"), "?x ?y ?z")
        .expect("Query should run");
    assert!(result.is_empty());
}

#[test]
fn test_join_fans_out() {
    let engine = engine();
    let result = run(
        &engine,
        &query("?x p ?y; ?y q ?z"),
        graph_with("a p b; a p c; b q d; b q e; c q f; g q h"),
        "?x ?z",
    )
    .expect("Query should run");
    assert_eq!(result, rows(&["[a, d]", "[a, e]", "[a, f]"]));
}

#[test]
fn test_repeated_variable_in_one_pattern() {
    let engine = engine();
    let result = run(
        &engine,
        &query("?x knows ?x"),
        graph_with("a knows a; a knows b; c knows c"),
        "?x",
    )
    .expect("Query should run");
    assert_eq!(result, rows(&["[a]", "[c]"]));
}

#[test]
fn test_wildcard_position() {
    let engine = engine();
    let result = run(&engine, &query("?x ?? b"), graph_with("a p b; c q b; d p e"), "?x")
        .expect("Query should run");
    assert_eq!(result, rows(&["[a]", "[c]"]));
}
