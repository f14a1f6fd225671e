//! Closing results before exhaustion must stop every stage.

use std::sync::Arc;
use std::time::Duration;

use crate::e2e_tests::helpers::*;
use crate::graph::MemoryGraph;
use crate::query::StageState;

fn big_graph() -> Arc<MemoryGraph> {
    let text = (0..40)
        .flat_map(|i| (0..40).map(move |j| format!("a{i} p b{j}; b{j} q c{i}")))
        .collect::<Vec<_>>()
        .join("; ");
    Arc::new(MemoryGraph::from_text(&text).expect("Graph should parse"))
}

#[test]
fn test_close_before_exhaustion() {
    let engine = engine_with_capacity(2);
    let query = query("?x p ?y; ?y q ?z").add_constraint(ne("?x", "?z"));
    let mut results = engine
        .execute_bindings(&query, big_graph(), &[var("x")])
        .expect("Query should start");

    assert!(results.next().is_some());
    let states: Vec<Arc<StageState>> = results.stage_states().to_vec();
    results.close();

    assert!(states.iter().all(|s| !s.is_open()));
    assert!(wait_closed(&states, Duration::from_secs(10)));
    assert!(results.is_finished());
}

#[test]
fn test_drop_cancels_pipeline() {
    let engine = engine_with_capacity(1);
    let results = engine
        .execute_bindings(&query("?x p ?y; ?y q ?z"), big_graph(), &[var("z")])
        .expect("Query should start");
    let states: Vec<Arc<StageState>> = results.stage_states().to_vec();
    drop(results);

    assert!(wait_closed(&states, Duration::from_secs(10)));
}

#[test]
fn test_engine_runs_more_queries_after_close() {
    let engine = engine_with_capacity(1);
    for _ in 0..20 {
        let mut results = engine
            .execute_bindings(&query("?x p ?y"), big_graph(), &[var("x")])
            .expect("Query should start");
        assert!(results.next().is_some());
        results.close();
    }
    let result = run(&engine, &query("a0 p ?y"), big_graph(), "?y").expect("Query should run");
    assert_eq!(result.len(), 40);
}
