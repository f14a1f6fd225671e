//! Blocks bound to different named graphs.

use std::sync::Arc;

use crate::e2e_tests::helpers::*;
use crate::graph::{GraphArgs, Triple};
use crate::query::{Query, QueryError};

fn cross_graph_query() -> Query {
    Query::new()
        .add_named_match("people", Triple::parse("?p worksAt ?c").expect("triple"))
        .add_named_match("places", Triple::parse("?c locatedIn ?city").expect("triple"))
}

#[test]
fn test_join_across_named_graphs() {
    let engine = engine();
    let graphs = GraphArgs::new()
        .put("people", graph_with("ann worksAt acme; bob worksAt initech"))
        .put("places", graph_with("acme locatedIn paris; globex locatedIn rome"));

    let result =
        run_in(&engine, &cross_graph_query(), &graphs, "?p ?city").expect("Query should run");
    assert_eq!(result, rows(&["[ann, paris]"]));
}

#[test]
fn test_blocks_do_not_see_each_others_graph() {
    let engine = engine();
    let everything = "ann worksAt acme; acme locatedIn paris";
    let graphs = GraphArgs::new()
        .put("people", graph_with(everything))
        .put("places", graph_with("acme locatedIn rome"));

    let result =
        run_in(&engine, &cross_graph_query(), &graphs, "?city").expect("Query should run");
    assert_eq!(result, rows(&["[rome]"]));
}

#[test]
fn test_missing_named_graph() {
    let engine = engine();
    let graphs = GraphArgs::new().put("people", graph_with("ann worksAt acme"));
    let result = engine.execute_bindings_in(&cross_graph_query(), &graphs, &[]);
    assert_eq!(result.err(), Some(QueryError::MissingGraph("places".to_owned())));
}

#[test]
fn test_default_graph_answers_unnamed_blocks() {
    let engine = engine();
    let shared = graph_with("ann worksAt acme; acme locatedIn paris");
    let graphs = GraphArgs::single(Arc::clone(&shared));
    let result =
        run_in(&engine, &cross_graph_query(), &graphs, "?p ?city").expect("Query should run");
    assert_eq!(result, rows(&["[ann, paris]"]));
}
