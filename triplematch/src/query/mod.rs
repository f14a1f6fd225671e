//! Staged pattern-matching query engine.
//!
//! This module compiles triple-pattern queries and runs them as a pipeline
//! of concurrent stages connected by bounded pipes.
//! It supports:
//! - Pattern blocks joined depth-first, one stage per block
//! - Named-graph blocks
//! - Constraints, placed as early guards where their variables allow
//! - Selectivity-driven reordering of each block
//! - Cooperative cancellation and error propagation through pipes
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use triplematch::config::EngineConfig;
//! use triplematch::graph::{MemoryGraph, Triple, terms};
//! use triplematch::query::{Engine, Expression, Query};
//!
//! let graph = Arc::new(MemoryGraph::from_text("a p b; a p c").unwrap());
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//!
//! let query = Query::new()
//!     .add_match_triple(Triple::parse("?x p ?y").unwrap())
//!     .add_constraint(Expression::ne(Expression::token("?y"), Expression::token("c")));
//!
//! let rows: Vec<_> = engine
//!     .execute_bindings(&query, graph, &terms("?x ?y"))
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(rows.len(), 1);
//! ```

pub mod compiler;
pub mod constraint_stage;
pub mod domain;
pub mod element;
pub mod engine;
pub mod error;
pub mod expression;
pub mod guard;
pub mod mapping;
pub mod pattern_stage;
pub mod pipe;
pub mod relation;
pub mod rewrite;
pub mod sorter;
pub mod stage;
mod tree;
pub mod types;
pub mod valuator;
pub mod worker;

pub use domain::Domain;
pub use engine::{BindingPlan, Engine, QueryResults};
pub use error::QueryError;
pub use expression::{Expression, ExpressionSet, PatternLiteral};
pub use relation::{Relation, RelationRegistry, Value};
pub use sorter::{TripleSorter, UnsortedTripleSorter, WeightedTripleSorter};
pub use stage::StageState;
pub use types::{Block, Query};
