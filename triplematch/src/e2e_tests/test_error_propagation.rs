//! Store and evaluation errors reach the consumer through the pipes.

use std::sync::Arc;
use std::time::Duration;

use crate::e2e_tests::helpers::*;
use crate::graph::{Graph, GraphArgs, GraphError, Triple};
use crate::query::expression::{EQ, Expression, NOT};
use crate::query::{Query, QueryError};

#[test]
fn test_store_error_reaches_consumer() {
    let engine = engine();
    let failing: Arc<dyn Graph> = Arc::new(FailingGraph::new("disk gone"));
    let mut results = engine
        .execute_bindings(&query("?x p ?y"), failing, &[var("x")])
        .expect("Query should start");

    let first = results.next();
    assert_eq!(
        first,
        Some(Err(QueryError::Graph(GraphError::Unavailable("disk gone".to_owned()))))
    );
    assert!(results.next().is_none());
    assert!(wait_closed(results.stage_states(), Duration::from_secs(10)));
}

#[test]
fn test_store_error_in_later_block_crosses_constraint_stage() {
    let engine = engine();
    let graphs = GraphArgs::single(graph_with("a p b; a p c"))
        .put("broken", Arc::new(FailingGraph::new("offline")));
    let query = Query::new()
        .add_match_triple(Triple::parse("?x p ?y").expect("triple"))
        .add_named_match("broken", Triple::parse("?y q ?z").expect("triple"))
        .add_constraint(eq("a", "a"));

    let result = run_in(&engine, &query, &graphs, "?x");
    assert_eq!(
        result,
        Err(QueryError::Graph(GraphError::Unavailable("offline".to_owned())))
    );
}

#[test]
fn test_evaluation_error_reaches_consumer() {
    let engine = engine();
    let query = query("?x p ?y").add_constraint(Expression::apply(
        NOT,
        vec![Expression::token("?y")],
    ));
    let result = run(&engine, &query, graph_with("a p b"), "?x");
    assert!(matches!(result, Err(QueryError::NotBoolean(_))));
}

#[test]
fn test_compile_errors_are_returned_before_execution() {
    let engine = engine();
    let unknown = query("?x p ?y").add_constraint(Expression::apply(
        "ex:nope",
        vec![Expression::token("?y")],
    ));
    let result = engine.execute_bindings(&unknown, graph_with(""), &[]);
    assert_eq!(result.err(), Some(QueryError::UnknownFunction("ex:nope".to_owned())));

    let arity = query("?x p ?y").add_constraint(Expression::apply(
        EQ,
        vec![Expression::token("?y")],
    ));
    let result = engine.execute_bindings(&arity, graph_with(""), &[]);
    assert!(matches!(result, Err(QueryError::WrongArity { .. })));

    let unmapped = query("?x p ?y").add_constraint(ne("?nowhere", "a"));
    let result = engine.execute_bindings(&unmapped, graph_with(""), &[]);
    assert_eq!(result.err(), Some(QueryError::UnboundVariable(var("nowhere"))));
}

#[test]
fn test_rows_before_store_failure_are_delivered() {
    let engine = engine();
    let graph: Arc<dyn Graph> =
        Arc::new(TruncatedGraph::new("a p b; a p c; a p d", 2, "cut off"));
    let mut results = engine
        .execute_bindings(&query("?x p ?y"), graph, &[var("y")])
        .expect("Query should start");

    let seen: Vec<String> = results
        .by_ref()
        .take(2)
        .map(|row| row.expect("Rows before the failure are valid").to_string())
        .collect();
    assert_eq!(seen, vec!["[b]", "[c]"]);
    assert_eq!(
        results.next(),
        Some(Err(QueryError::Graph(GraphError::Unavailable("cut off".to_owned()))))
    );
    assert!(results.next().is_none());
    assert!(wait_closed(results.stage_states(), Duration::from_secs(10)));
}

#[test]
fn test_rows_before_store_failure_cross_constraint_stage() {
    let engine = engine_with_capacity(1);
    let graph: Arc<dyn Graph> =
        Arc::new(TruncatedGraph::new("a p b; a p c; a p d", 1, "cut off"));
    let query = query("?x p ?y").add_constraint(eq("a", "a"));
    let mut results = engine
        .execute_bindings(&query, graph, &[var("y")])
        .expect("Query should start");

    assert_eq!(
        results.next().map(|row| row.map(|d| d.to_string())),
        Some(Ok("[b]".to_owned()))
    );
    assert!(matches!(results.next(), Some(Err(QueryError::Graph(_)))));
    assert!(results.next().is_none());
}
