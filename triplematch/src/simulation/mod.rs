//! Deterministic simulation testing.
//!
//! This module checks the engine against a naive evaluator on random
//! workloads:
//! - Seeded random graphs and queries (same seed, same workload)
//! - A nested-loop reference evaluator with no sorting or pipelining
//! - Invariant checking after each query
//!
//! # Invariants
//!
//! 1. Soundness: every row the engine produces is a reference row
//! 2. Completeness: every reference row is produced, with multiplicity
//! 3. A sorted block is a permutation of the written block
//! 4. Results do not depend on the triple sorter
//!
//! # Usage
//!
//! ```
//! use triplematch::simulation::{Simulator, SimulatorConfig};
//!
//! let mut sim = Simulator::new(SimulatorConfig::new(12345));
//! let result = sim.run(10);
//!
//! assert!(result.passed());
//! ```

mod generator;
mod invariants;
mod reference;
mod simulator;

pub use generator::{GeneratedConstraint, GeneratedQuery, GeneratorConfig, WorkloadGenerator};
pub use invariants::{InvariantChecker, InvariantViolation};
pub use reference::reference_bindings;
pub use simulator::{SimulationResult, Simulator, SimulatorConfig};
