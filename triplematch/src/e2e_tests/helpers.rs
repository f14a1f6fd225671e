//! Common helpers for end-to-end tests.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::graph::{Graph, GraphArgs, Term, terms, triples};
use crate::query::expression::Expression;
use crate::query::{Engine, Query, QueryError, QueryResults, StageState};
use crate::testing::init_tracing;

pub use crate::testing::{CountingGraph, FailingGraph, TruncatedGraph, graph_with};

/// Create an engine with the default configuration.
#[allow(clippy::expect_used)]
pub fn engine() -> Engine {
    init_tracing();
    Engine::new(EngineConfig::default()).expect("Engine should start")
}

/// Create an engine with the given pipe capacity.
#[allow(clippy::expect_used)]
pub fn engine_with_capacity(capacity: usize) -> Engine {
    init_tracing();
    Engine::new(EngineConfig::default().with_pipe_capacity(capacity)).expect("Engine should start")
}

/// Build a query whose default block holds the `;`-separated patterns.
#[allow(clippy::expect_used)]
pub fn query(patterns: &str) -> Query {
    triples(patterns)
        .expect("Patterns should parse")
        .into_iter()
        .fold(Query::new(), Query::add_match_triple)
}

/// `q:ne(left, right)` over tokens.
pub fn ne(left: &str, right: &str) -> Expression {
    Expression::ne(Expression::token(left), Expression::token(right))
}

/// `q:eq(left, right)` over tokens.
pub fn eq(left: &str, right: &str) -> Expression {
    Expression::eq(Expression::token(left), Expression::token(right))
}

/// Run a query and render each row, sorted.
pub fn run(
    engine: &Engine,
    query: &Query,
    graph: Arc<dyn Graph>,
    outputs: &str,
) -> Result<Vec<String>, QueryError> {
    let results = engine.execute_bindings(query, graph, &terms(outputs))?;
    rendered(results)
}

/// Run a query against named graphs and render each row, sorted.
pub fn run_in(
    engine: &Engine,
    query: &Query,
    graphs: &GraphArgs,
    outputs: &str,
) -> Result<Vec<String>, QueryError> {
    let results = engine.execute_bindings_in(query, graphs, &terms(outputs))?;
    rendered(results)
}

/// Drain results into sorted rendered rows.
pub fn rendered(results: QueryResults) -> Result<Vec<String>, QueryError> {
    let mut rows = results
        .map(|row| row.map(|domain| domain.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    rows.sort();
    Ok(rows)
}

/// Build the expected sorted rows.
pub fn rows(expected: &[&str]) -> Vec<String> {
    let mut rows: Vec<String> = expected.iter().map(|&r| r.to_owned()).collect();
    rows.sort();
    rows
}

/// A variable term.
pub fn var(name: &str) -> Term {
    Term::var(name)
}

/// Wait until every stage has closed, or the timeout expires.
pub fn wait_closed(states: &[Arc<StageState>], timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if states.iter().all(|s| s.is_closed()) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    states.iter().all(|s| s.is_closed())
}
