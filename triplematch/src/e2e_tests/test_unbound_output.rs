//! Output variables that no pattern binds come back unset.

use crate::e2e_tests::helpers::*;
use crate::graph::terms;

#[test]
fn test_unbound_output_is_none() {
    let engine = engine();
    let results = engine
        .execute_bindings(&query("?x p b"), graph_with("a p b; c p b"), &terms("?nowhere ?x"))
        .expect("Query should start");

    let mut seen = Vec::new();
    for row in results {
        let row = row.expect("Query should not fail");
        assert_eq!(row.size(), 2);
        assert!(row.get(0).is_none());
        seen.push(row.get(1).map(ToString::to_string).expect("?x is bound"));
    }
    seen.sort();
    assert_eq!(seen, vec!["a", "c"]);
}

#[test]
fn test_duplicate_outputs_share_a_slot() {
    let engine = engine();
    let result =
        run(&engine, &query("?x p ?y"), graph_with("a p b"), "?x ?y ?x").expect("Query should run");
    assert_eq!(result, rows(&["[a, b, a]"]));
}
