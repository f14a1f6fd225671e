//! Results do not depend on the triple sorter; the weighted sorter queries
//! the store less.

use std::sync::Arc;

use crate::e2e_tests::helpers::*;
use crate::graph::Graph;
use crate::query::{Query, UnsortedTripleSorter, WeightedTripleSorter};

fn workload() -> String {
    let mut items = Vec::new();
    for i in 0..10 {
        for j in 0..10 {
            for predicate in ["X", "X1", "X2"] {
                items.push(format!("a{i} {predicate} b{j}"));
            }
        }
    }
    items.push("a SPOO d; a X b; b Y c".to_owned());
    items.join("; ")
}

fn optimisable_query() -> Query {
    query("?a ?? ?d; ?a X ?b; ?b Y ?c").add_constraint(ne("?d", "?b"))
}

#[test]
fn test_weighted_sorter_reorders_block() {
    let engine = engine();
    let plan = engine
        .prepare(
            &optimisable_query(),
            &crate::graph::GraphArgs::single(graph_with(&workload())),
            &[var("a"), var("d")],
        )
        .expect("Query should prepare");
    let order: Vec<String> = plan.block_order()[0].iter().map(ToString::to_string).collect();
    assert_eq!(order, vec!["?a X ?b", "?b Y ?c", "?a ?? ?d"]);
}

#[test]
fn test_sorters_agree_and_weighted_does_fewer_lookups() {
    let engine = engine();
    let counting = Arc::new(CountingGraph::new(&workload()));
    let graph: Arc<dyn Graph> = counting.clone();

    let weighted = optimisable_query().set_triple_sorter(Arc::new(WeightedTripleSorter));
    let sorted_rows = run(&engine, &weighted, Arc::clone(&graph), "?a ?d").expect("Query should run");
    let sorted_lookups = counting.lookups();

    counting.reset();
    let unsorted = optimisable_query().set_triple_sorter(Arc::new(UnsortedTripleSorter));
    let unsorted_rows = run(&engine, &unsorted, graph, "?a ?d").expect("Query should run");
    let unsorted_lookups = counting.lookups();

    assert_eq!(sorted_rows, rows(&["[a, d]"]));
    assert_eq!(sorted_rows, unsorted_rows);
    assert!(
        sorted_lookups <= unsorted_lookups,
        "weighted {sorted_lookups} > unsorted {unsorted_lookups}"
    );
}

#[test]
fn test_sorters_agree_on_join_chain() {
    let engine = engine();
    let data = graph_with("a p b; b p c; c p d; d p a; a q z; c q z");
    let patterns = "?w p ?x; ?x p ?y; ?y q ?z; ?y p ?v";
    let weighted = run(&engine, &query(patterns), Arc::clone(&data), "?w ?v")
        .expect("Query should run");
    let unsorted = run(
        &engine,
        &query(patterns).set_triple_sorter(Arc::new(UnsortedTripleSorter)),
        data,
        "?w ?v",
    )
    .expect("Query should run");
    assert_eq!(weighted, unsorted);
    assert_eq!(weighted, rows(&["[a, d]", "[c, b]"]));
}
