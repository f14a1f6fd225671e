//! Query engine implementation.
//!
//! The `Engine` turns a declarative [`Query`] into a running stage
//! pipeline:
//!
//! 1. Build the [`Mapping`], pre-declaring the output variables
//! 2. Sort and compile each pattern block
//! 3. Place constraints as guards where possible, leaving the rest for a
//!    final constraint stage
//! 4. Chain Initial → one pattern stage per block → constraint stage and
//!    start delivering
//!
//! Results stream back through [`QueryResults`], projected onto the
//! caller's output variables.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::graph::{Graph, GraphArgs, Term, Triple};

use super::compiler::PatternCompiler;
use super::constraint_stage::ConstraintStage;
use super::domain::Domain;
use super::element::QueryTriple;
use super::error::QueryError;
use super::guard::GuardArranger;
use super::mapping::Mapping;
use super::pattern_stage::PatternStage;
use super::pipe::PipeReceiver;
use super::relation::RelationRegistry;
use super::stage::{InitialStage, Stage, StageContext, StageState};
use super::types::Query;
use super::valuator::ValuatorSet;
use super::worker::WorkerPool;

/// The query engine: configuration, worker pool and relation registry.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    pool: WorkerPool,
    relations: RelationRegistry,
}

impl Engine {
    /// Create an engine with its own worker pool.
    ///
    /// # Errors
    ///
    /// Returns `WorkerPool` if the pool cannot be started.
    pub fn new(config: EngineConfig) -> Result<Self, QueryError> {
        let pool = WorkerPool::new(&config)?;
        info!(
            pipe_capacity = config.pipe_capacity,
            max_workers = config.max_workers,
            "Query engine ready"
        );
        Ok(Self {
            config,
            pool,
            relations: RelationRegistry::with_builtins(),
        })
    }

    /// Create an engine that runs stages on an existing runtime.
    #[must_use]
    pub fn with_handle(config: EngineConfig, handle: Handle) -> Self {
        Self {
            config,
            pool: WorkerPool::from_handle(handle),
            relations: RelationRegistry::with_builtins(),
        }
    }

    /// Mutable access for registering additional relations.
    pub const fn relations_mut(&mut self) -> &mut RelationRegistry {
        &mut self.relations
    }

    /// Compile a query into an executable plan.
    ///
    /// # Errors
    ///
    /// - `NotAVariable` if an output is not a variable
    /// - `MissingGraph` if a block's graph is not in `graphs`
    /// - `UnboundVariable` if a constraint mentions a variable that neither
    ///   a pattern nor the outputs declare
    /// - `UnknownFunction` / `WrongArity` for malformed constraints
    pub fn prepare(
        &self,
        query: &Query,
        graphs: &GraphArgs,
        outputs: &[Term],
    ) -> Result<BindingPlan, QueryError> {
        let mut mapping = Mapping::with_outputs(outputs)?;

        let mut blocks = Vec::with_capacity(query.blocks().len());
        let mut compiled = Vec::with_capacity(query.blocks().len());
        for block in query.blocks() {
            let graph = graphs
                .get(&block.name)
                .ok_or_else(|| QueryError::MissingGraph(block.name.clone()))?;
            let sorted = query.sorter().sort(&block.triples);
            compiled.push(PatternCompiler::new(&mut mapping).compile_all(&sorted)?);
            blocks.push(PlannedBlock {
                name: block.name.clone(),
                graph: Arc::clone(graph),
                order: sorted,
            });
        }

        let arrangement =
            GuardArranger::new(&compiled).arrange(query.constraints().iter().cloned(), &mapping)?;
        let guards = arrangement
            .guards
            .iter()
            .map(|block| {
                block
                    .iter()
                    .map(|exprs| ValuatorSet::compile(exprs, &mapping, &self.relations))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        let remaining = ValuatorSet::compile(&arrangement.remaining, &mapping, &self.relations)?;

        let projection = outputs
            .iter()
            .map(|output| mapping.index_of(output))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            slots = mapping.size(),
            blocks = blocks.len(),
            guards = arrangement.guard_count(),
            remaining = remaining.len(),
            "Prepared query plan"
        );

        Ok(BindingPlan {
            variable_count: mapping.size(),
            projection,
            blocks,
            compiled,
            guards,
            remaining,
        })
    }

    /// Run a query against a single graph.
    ///
    /// # Errors
    ///
    /// Returns any compilation error from [`prepare`](Self::prepare).
    pub fn execute_bindings(
        &self,
        query: &Query,
        graph: Arc<dyn Graph>,
        outputs: &[Term],
    ) -> Result<QueryResults, QueryError> {
        self.execute_bindings_in(query, &GraphArgs::single(graph), outputs)
    }

    /// Run a query against named graphs.
    ///
    /// # Errors
    ///
    /// Returns any compilation error from [`prepare`](Self::prepare).
    pub fn execute_bindings_in(
        &self,
        query: &Query,
        graphs: &GraphArgs,
        outputs: &[Term],
    ) -> Result<QueryResults, QueryError> {
        self.prepare(query, graphs, outputs)?.execute(self)
    }
}

/// One pattern block resolved against its graph.
struct PlannedBlock {
    name: String,
    graph: Arc<dyn Graph>,
    order: Vec<Triple>,
}

impl fmt::Debug for PlannedBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlannedBlock")
            .field("name", &self.name)
            .field("graph_size", &self.graph.size())
            .field("order", &self.order)
            .finish()
    }
}

/// A compiled query, ready to run once.
#[derive(Debug)]
pub struct BindingPlan {
    variable_count: usize,
    /// Output slot for each requested variable, in caller order.
    projection: Vec<usize>,
    blocks: Vec<PlannedBlock>,
    compiled: Vec<Vec<QueryTriple>>,
    guards: Vec<Vec<ValuatorSet>>,
    remaining: ValuatorSet,
}

impl BindingPlan {
    /// Number of slots in each domain.
    #[must_use]
    pub const fn variable_count(&self) -> usize {
        self.variable_count
    }

    /// The sorted pattern order of each block.
    #[must_use]
    pub fn block_order(&self) -> Vec<&[Triple]> {
        self.blocks.iter().map(|b| b.order.as_slice()).collect()
    }

    /// Number of constraints left for the final constraint stage.
    #[must_use]
    pub fn remaining_constraints(&self) -> usize {
        self.remaining.len()
    }

    /// Build the stage chain and start it.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline cannot be delivered.
    pub fn execute(self, engine: &Engine) -> Result<QueryResults, QueryError> {
        let Self {
            variable_count,
            projection,
            blocks,
            compiled,
            guards,
            remaining,
        } = self;

        let initial = InitialStage::new(variable_count);
        let mut states = vec![initial.state()];
        let mut terminal: Box<dyn Stage> = Box::new(initial);

        for (i, ((block, triples), guards)) in
            blocks.into_iter().zip(compiled).zip(guards).enumerate()
        {
            let mut stage = PatternStage::new(format!("pattern[{i}]"), block.graph, triples, guards);
            stage.connect_from(terminal);
            states.push(stage.state());
            terminal = Box::new(stage);
        }

        if !remaining.is_empty() {
            let mut stage = ConstraintStage::new(remaining);
            stage.connect_from(terminal);
            states.push(stage.state());
            terminal = Box::new(stage);
        }

        let context = StageContext::new(&engine.pool, engine.config.pipe_capacity);
        let (sink, receiver) = context.pipe();
        terminal.deliver(sink, &context)?;
        debug!(stages = states.len(), "Started query pipeline");

        Ok(QueryResults {
            receiver,
            projection,
            states,
            variable_count,
        })
    }
}

/// Streaming query results.
///
/// Each item is a domain with one slot per requested output variable, in
/// the caller's order; a variable no pattern binds comes back unset.
/// Dropping the results cancels the pipeline.
#[derive(Debug)]
pub struct QueryResults {
    receiver: PipeReceiver,
    projection: Vec<usize>,
    /// Pipeline order: initial first, terminal last.
    states: Vec<Arc<StageState>>,
    variable_count: usize,
}

impl QueryResults {
    /// Wait until another result or the end of the stream is available.
    ///
    /// # Errors
    ///
    /// Returns the pipeline's error, once.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn has_next(&mut self) -> Result<bool, QueryError> {
        self.receiver.has_next()
    }

    /// Receive the next result asynchronously.
    pub async fn recv(&mut self) -> Option<Result<Domain, QueryError>> {
        let next = self.receiver.recv().await;
        next.map(|result| result.map(|domain| domain.project(&self.projection)))
    }

    /// Cancel the pipeline.
    ///
    /// Every stage is asked to stop, terminal first, and the result pipe is
    /// closed so that a stage blocked on it wakes up and exits.
    pub fn close(&mut self) {
        for state in self.states.iter().rev() {
            state.cancel();
        }
        self.receiver.close();
    }

    /// The state of every stage, initial first.
    #[must_use]
    pub fn stage_states(&self) -> &[Arc<StageState>] {
        &self.states
    }

    /// True once every stage worker has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.states.iter().all(|s| s.is_closed())
    }

    /// Number of slots in the internal domains.
    #[must_use]
    pub const fn variable_count(&self) -> usize {
        self.variable_count
    }
}

/// Blocking iteration for synchronous callers.
///
/// # Panics
///
/// `next` blocks on the result pipe and panics if called from within an
/// async runtime. Async callers should use `recv` or the `Stream` impl
/// instead.
impl Iterator for QueryResults {
    type Item = Result<Domain, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.receiver.next();
        next.map(|result| result.map(|domain| domain.project(&self.projection)))
    }
}

impl Stream for QueryResults {
    type Item = Result<Domain, QueryError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        Pin::new(&mut this.receiver)
            .poll_next(cx)
            .map(|next| next.map(|result| result.map(|domain| domain.project(&this.projection))))
    }
}

impl Drop for QueryResults {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{MemoryGraph, terms, triples};
    use crate::query::expression::Expression;

    fn engine() -> Engine {
        Engine::new(EngineConfig::default()).expect("engine")
    }

    fn graph(text: &str) -> Arc<dyn Graph> {
        Arc::new(MemoryGraph::from_text(text).expect("graph"))
    }

    fn query(patterns: &str) -> Query {
        triples(patterns)
            .expect("patterns")
            .into_iter()
            .fold(Query::new(), Query::add_match_triple)
    }

    fn rows(results: QueryResults) -> Vec<String> {
        let mut rows: Vec<String> = results
            .map(|r| r.expect("result").to_string())
            .collect();
        rows.sort();
        rows
    }

    #[test]
    fn test_variable_count() {
        let engine = engine();
        let g = graph("a R b");
        let cases = [
            ("?x R ?x", "", 1),
            ("?x R ?y", "", 2),
            ("?x R y", "?z", 2),
            ("?x R ?y; ?y R ?z", "?x", 3),
        ];
        for (patterns, outputs, expected) in cases {
            let plan = engine
                .prepare(&query(patterns), &GraphArgs::single(Arc::clone(&g)), &terms(outputs))
                .expect("prepare");
            assert_eq!(plan.variable_count(), expected, "{patterns} / {outputs}");
        }
    }

    #[test]
    fn test_projection_in_caller_order() {
        let engine = engine();
        let results = engine
            .execute_bindings(&query("?x p ?y"), graph("a p b"), &terms("?y ?x"))
            .expect("execute");
        assert_eq!(rows(results), vec!["[b, a]"]);
    }

    #[test]
    fn test_unbound_output_is_unset() {
        let engine = engine();
        let results = engine
            .execute_bindings(&query("?x p b"), graph("a p b"), &terms("?x ?nowhere"))
            .expect("execute");
        assert_eq!(rows(results), vec!["[a, -]"]);
    }

    #[test]
    fn test_empty_query_yields_one_empty_binding() {
        let engine = engine();
        let results = engine
            .execute_bindings(&Query::new(), graph(""), &[])
            .expect("execute");
        assert_eq!(rows(results), vec!["[]"]);
    }

    #[test]
    fn test_constraint_on_unmapped_variable() {
        let engine = engine();
        let query = query("?x p ?y")
            .add_constraint(Expression::eq(Expression::token("?z"), Expression::token("a")));
        let result = engine.prepare(&query, &GraphArgs::single(graph("")), &terms("?x"));
        assert_eq!(result.err(), Some(QueryError::UnboundVariable(Term::var("z"))));
    }

    #[test]
    fn test_missing_graph() {
        let engine = engine();
        let query = Query::new().add_named_match("other", Triple::parse("?x p ?y").expect("triple"));
        let result = engine.prepare(&query, &GraphArgs::new(), &[]);
        assert_eq!(result.err(), Some(QueryError::MissingGraph("other".to_owned())));
    }

    #[test]
    fn test_guards_absorb_constraints() {
        let engine = engine();
        let query = query("?x p ?y")
            .add_constraint(Expression::ne(Expression::token("?y"), Expression::token("c")));
        let plan = engine
            .prepare(&query, &GraphArgs::single(graph("a p b")), &terms("?x"))
            .expect("prepare");
        assert_eq!(plan.remaining_constraints(), 0);
        assert_eq!(plan.block_order().len(), 1);
    }

    #[test]
    fn test_stage_states_reported() {
        let engine = engine();
        let query = query("?x p ?y")
            .add_constraint(Expression::eq(Expression::token("a"), Expression::token("a")));
        let results = engine
            .execute_bindings(&query, graph("a p b"), &terms("?x"))
            .expect("execute");
        let labels: Vec<String> = results
            .stage_states()
            .iter()
            .map(|s| s.label().to_owned())
            .collect();
        assert_eq!(labels, vec!["initial", "pattern[0]", "constraint"]);
        assert_eq!(rows(results), vec!["[a]"]);
    }
}
