// Life of a query:
// 1. A `Query` is built from pattern blocks and constraints
// 2. `Engine::prepare` compiles it:
//     - Map output variables to the lowest slots
//     - Sort each block by selectivity, then compile its patterns
//     - Place constraints as guards or leave them for the final filter
// 3. `BindingPlan::execute` chains the stages and starts them:
//     Initial -> Pattern (one per block) -> Constraint (if needed)
// 4. `QueryResults` pulls domains from the last pipe and projects them
//
// System components:
//  - Graph store (trait + in-memory implementation)
//  - Pattern compiler and triple sorter
//  - Expression evaluator and relation registry
//  - Stage pipeline over bounded pipes and a blocking worker pool

pub mod config;
pub mod graph;
pub mod query;
pub mod simulation;

mod e2e_tests;
#[cfg(test)]
mod testing;

pub use config::{ConfigError, EngineConfig};
pub use graph::{Graph, GraphArgs, MemoryGraph, Term, Triple};
pub use query::{Engine, Query, QueryError, QueryResults};
