//! Consuming results from async code.

use tokio::runtime::Handle;

use crate::config::EngineConfig;
use crate::e2e_tests::helpers::*;
use crate::query::Engine;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_results_as_stream() {
    let engine = Engine::with_handle(EngineConfig::default(), Handle::current());
    let mut results = engine
        .execute_bindings(
            &query("?x p ?y; ?y q ?z"),
            graph_with("a p b; b q c; d p b"),
            &[var("x"), var("z")],
        )
        .expect("Query should start");

    // QueryResults is also an Iterator, so name the Stream method explicitly.
    let mut rendered = Vec::new();
    while let Some(row) = futures::StreamExt::next(&mut results).await {
        rendered.push(row.expect("Query should not fail").to_string());
    }
    rendered.sort();
    assert_eq!(rendered, rows(&["[a, c]", "[d, c]"]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_recv_until_end() {
    let engine = Engine::with_handle(EngineConfig::default().with_pipe_capacity(1), Handle::current());
    let mut results = engine
        .execute_bindings(&query("?x p ?y"), graph_with("a p b; a p c; a p d"), &[var("y")])
        .expect("Query should start");

    let mut count = 0;
    while let Some(row) = results.recv().await {
        assert_eq!(row.expect("Query should not fail").size(), 1);
        count += 1;
    }
    assert_eq!(count, 3);
    assert!(results.recv().await.is_none());
}
