//! Constraints that can only be checked once several variables are bound.

use crate::e2e_tests::helpers::*;
use crate::query::expression::Expression;

#[test]
fn test_ne_between_two_variables() {
    let engine = engine();
    let query = query("?x pinged ?y").add_constraint(ne("?x", "?y"));
    let result = run(
        &engine,
        &query,
        graph_with("bill pinged ben; ben pinged weed; weed pinged weed"),
        "?x",
    )
    .expect("Query should run");
    assert_eq!(result, rows(&["[ben]", "[bill]"]));
}

#[test]
fn test_conjunction_is_split() {
    let engine = engine();
    let query = query("?x p ?y")
        .add_constraint(Expression::and(ne("?y", "b"), ne("?y", "c")));
    assert_eq!(query.constraints().len(), 2);

    let result = run(&engine, &query, graph_with("a p b; a p c; a p d"), "?y")
        .expect("Query should run");
    assert_eq!(result, rows(&["[d]"]));
}

#[test]
fn test_disjunction_and_negation() {
    let engine = engine();
    let query = query("?x p ?y").add_constraint(Expression::or(
        eq("?y", "b"),
        Expression::not(ne("?y", "d")),
    ));
    let result = run(&engine, &query, graph_with("a p b; a p c; a p d"), "?y")
        .expect("Query should run");
    assert_eq!(result, rows(&["[b]", "[d]"]));
}

#[test]
fn test_numeric_literals_compare_by_value() {
    let engine = engine();
    let query = query("?x age ?n").add_constraint(Expression::eq(
        Expression::token("?n"),
        Expression::token("'042'^^xsd:int"),
    ));
    let result = run(&engine, &query, graph_with("a age 42; b age 7"), "?x")
        .expect("Query should run");
    assert_eq!(result, rows(&["[a]"]));
}

#[test]
fn test_constraint_on_output_only_variable_fails_at_run_time() {
    let engine = engine();
    let query = query("?x p ?y").add_constraint(eq("?z", "a"));
    let result = run(&engine, &query, graph_with("a p b"), "?x ?z");
    assert!(matches!(result, Err(crate::query::QueryError::UnsetVariable(_))));
}
