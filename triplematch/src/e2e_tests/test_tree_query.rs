//! Tree queries return the matched subgraph.

use crate::e2e_tests::helpers::*;
use crate::graph::MemoryGraph;

fn sorted(graph: &MemoryGraph) -> Vec<String> {
    let mut triples: Vec<String> = graph.iter().map(ToString::to_string).collect();
    triples.sort();
    triples
}

#[test]
fn test_tree_query_collects_every_instantiation() {
    let engine = engine();
    let data = graph_with(
        "ann knows bob; bob knows cat; ann age 30; bob age 40; cat age 50; dan likes ann",
    );
    let pattern = MemoryGraph::from_text("_p knows _q; _q age _n").expect("Pattern should parse");

    let result = engine.execute_tree(data, &pattern).expect("Tree query should run");
    assert_eq!(
        sorted(&result),
        vec![
            "ann knows bob",
            "bob age '40'^^xsd:integer",
            "bob knows cat",
            "cat age '50'^^xsd:integer",
        ]
    );
}

#[test]
fn test_tree_query_with_constant_anchor() {
    let engine = engine();
    let data = graph_with("ann knows bob; bob knows cat; ann likes tea");
    let pattern = MemoryGraph::from_text("ann knows _q").expect("Pattern should parse");
    let result = engine.execute_tree(data, &pattern).expect("Tree query should run");
    assert_eq!(sorted(&result), vec!["ann knows bob"]);
}
