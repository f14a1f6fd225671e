//! A query with no patterns yields exactly one empty binding.

use crate::e2e_tests::helpers::*;
use crate::query::Query;

#[test]
fn test_empty_query_single_result() {
    let engine = engine();
    let result = run(&engine, &Query::new(), graph_with(""), "").expect("Query should run");
    assert_eq!(result, rows(&["[]"]));
}

#[test]
fn test_empty_query_with_outputs_leaves_them_unset() {
    let engine = engine();
    let result = run(&engine, &Query::new(), graph_with("a p b"), "?x ?y").expect("Query should run");
    assert_eq!(result, rows(&["[-, -]"]));
}

#[test]
fn test_empty_graph_yields_nothing() {
    let engine = engine();
    let result = run(&engine, &query("?x p ?y"), graph_with(""), "?x").expect("Query should run");
    assert!(result.is_empty());
}
