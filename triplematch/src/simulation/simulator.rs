//! Main simulator harness.
//!
//! For each seed the simulator draws one graph and a sequence of queries,
//! runs every query through the engine twice (weighted and unsorted
//! plans) and checks the results against the reference evaluator.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::graph::{Graph, GraphArgs, MemoryGraph};
use crate::query::{
    Domain, Engine, Query, QueryError, TripleSorter, UnsortedTripleSorter, WeightedTripleSorter,
};

use super::generator::{GeneratedQuery, GeneratorConfig, WorkloadGenerator};
use super::invariants::{InvariantChecker, InvariantViolation};
use super::reference::reference_bindings;

/// Configuration for the simulator.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility.
    pub seed: u64,
    /// Workload generation configuration.
    pub generator: GeneratorConfig,
    /// Engine configuration.
    pub engine: EngineConfig,
}

impl SimulatorConfig {
    /// Create a new simulator config with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            generator: GeneratorConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Set the generator configuration.
    #[must_use]
    pub fn with_generator(mut self, config: GeneratorConfig) -> Self {
        self.generator = config;
        self
    }

    /// Set the engine configuration.
    #[must_use]
    pub const fn with_engine(mut self, config: EngineConfig) -> Self {
        self.engine = config;
        self
    }
}

/// Results from a simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The seed used for this simulation.
    pub seed: u64,
    /// Number of queries run.
    pub queries_run: u64,
    /// Total rows produced by the engine.
    pub rows_produced: u64,
    /// Invariant violations detected.
    pub invariant_violations: Vec<InvariantViolation>,
    /// Whether the simulation completed without engine errors.
    pub completed_successfully: bool,
    /// Error message if simulation failed.
    pub error: Option<String>,
}

impl SimulationResult {
    /// Check if the simulation passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.completed_successfully && self.invariant_violations.is_empty()
    }
}

/// The main simulator harness.
#[derive(Debug)]
pub struct Simulator {
    config: SimulatorConfig,
    generator: WorkloadGenerator,
    checker: InvariantChecker,
    queries_run: u64,
    rows_produced: u64,
}

fn build_query(generated: &GeneratedQuery, sorter: Arc<dyn TripleSorter>) -> Query {
    let query = generated
        .patterns
        .iter()
        .fold(Query::new(), |query, t| query.add_match_triple(t.clone()));
    generated
        .constraints
        .iter()
        .fold(query, |query, c| {
            query.add_constraint_triple(c.left.clone(), c.function, c.right.clone())
        })
        .set_triple_sorter(sorter)
}

fn collect(
    engine: &Engine,
    query: &Query,
    graph: &Arc<dyn Graph>,
    generated: &GeneratedQuery,
) -> Result<Vec<Domain>, QueryError> {
    engine
        .execute_bindings(query, Arc::clone(graph), &generated.outputs)?
        .collect()
}

impl Simulator {
    /// Create a new simulator with the given configuration.
    #[must_use]
    pub fn new(config: SimulatorConfig) -> Self {
        let generator = WorkloadGenerator::with_config(config.seed, config.generator.clone());
        Self {
            config,
            generator,
            checker: InvariantChecker::new(),
            queries_run: 0,
            rows_produced: 0,
        }
    }

    fn failed(&self, error: String) -> SimulationResult {
        SimulationResult {
            seed: self.config.seed,
            queries_run: self.queries_run,
            rows_produced: self.rows_produced,
            invariant_violations: self.checker.violations().to_vec(),
            completed_successfully: false,
            error: Some(error),
        }
    }

    /// Run the simulation for a given number of queries against one
    /// generated graph.
    pub fn run(&mut self, query_count: usize) -> SimulationResult {
        let engine = match Engine::new(self.config.engine.clone()) {
            Ok(engine) => engine,
            Err(e) => return self.failed(format!("Failed to start engine: {e}")),
        };

        let graph = Arc::new(self.generator.random_graph());
        info!(seed = self.config.seed, triples = graph.len(), "Starting simulation");
        let shared: Arc<dyn Graph> = graph.clone();

        for index in 0..query_count {
            let generated = self.generator.random_query();
            if let Err(e) = self.run_query(&engine, &graph, &shared, &generated, index) {
                return self.failed(format!("Query {index} failed: {e}"));
            }
        }

        SimulationResult {
            seed: self.config.seed,
            queries_run: self.queries_run,
            rows_produced: self.rows_produced,
            invariant_violations: self.checker.violations().to_vec(),
            completed_successfully: true,
            error: None,
        }
    }

    fn run_query(
        &mut self,
        engine: &Engine,
        graph: &MemoryGraph,
        shared: &Arc<dyn Graph>,
        generated: &GeneratedQuery,
        index: usize,
    ) -> Result<(), QueryError> {
        let weighted = build_query(generated, Arc::new(WeightedTripleSorter));
        let unsorted = build_query(generated, Arc::new(UnsortedTripleSorter));

        let args = GraphArgs::single(Arc::clone(shared));
        let plan = engine.prepare(&weighted, &args, &generated.outputs)?;
        for order in plan.block_order() {
            self.checker.check_permutation(&generated.patterns, order, index);
        }

        let sorted_rows = collect(engine, &weighted, shared, generated)?;
        let unsorted_rows = collect(engine, &unsorted, shared, generated)?;
        let expected = reference_bindings(graph, generated);

        let context = format!(
            "patterns: {:?}, outputs: {:?}",
            generated.patterns, generated.outputs
        );
        self.checker
            .check_results(&sorted_rows, &expected, index, &context);
        self.checker
            .check_sorter_independence(&sorted_rows, &unsorted_rows, index);

        debug!(index, rows = sorted_rows.len(), "Checked simulated query");
        self.queries_run += 1;
        self.rows_produced += sorted_rows.len() as u64;
        Ok(())
    }

    /// Get the invariant checker.
    #[must_use]
    pub const fn checker(&self) -> &InvariantChecker {
        &self.checker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_many_seeds() {
        crate::testing::init_tracing();
        for seed in 0..20 {
            let mut sim = Simulator::new(SimulatorConfig::new(seed));
            let result = sim.run(15);
            assert!(
                result.passed(),
                "seed {seed}: {:?} {:?}",
                result.error,
                result.invariant_violations
            );
            assert_eq!(result.queries_run, 15);
        }
    }

    #[test]
    fn test_simulation_with_tiny_pipes() {
        let config = SimulatorConfig::new(99)
            .with_engine(EngineConfig::default().with_pipe_capacity(1));
        let result = Simulator::new(config).run(20);
        assert!(result.passed(), "{:?}", result.invariant_violations);
    }

    #[test]
    fn test_simulation_dense_graph() {
        let generator = GeneratorConfig {
            nodes: 3,
            predicates: 2,
            triples: 40,
            ..GeneratorConfig::default()
        };
        let config = SimulatorConfig::new(5).with_generator(generator);
        let result = Simulator::new(config).run(10);
        assert!(result.passed(), "{:?}", result.invariant_violations);
        assert!(result.rows_produced > 0);
    }
}
