//! The graph store collaborator.
//!
//! The query engine does not own storage. It consumes any store that
//! implements [`Graph`]: a `find` over (subject, predicate, object) where
//! each position is either a concrete term or [`Term::Any`].
//!
//! # Concurrency
//!
//! Stage workers call `find` from pool threads while other queries may be
//! running against the same store, so implementations must be
//! `Send + Sync` and their iterators must not require external locking.

mod memory;
pub mod term;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub use memory::MemoryGraph;
pub use term::{Literal, Term, Triple, TripleParseError, terms, triples};

/// The name of the unnamed graph block.
pub const DEFAULT_GRAPH: &str = "";

/// Iterator returned by [`Graph::find`].
pub type TripleIter<'a> = Box<dyn Iterator<Item = Result<Triple, GraphError>> + Send + 'a>;

/// A read-only triple store.
pub trait Graph: Send + Sync {
    /// Find every stored triple matching the concrete positions.
    ///
    /// `Term::Any` matches anything. Concrete positions are matched by value
    /// (see [`Term::same_value_as`]).
    fn find(&self, subject: &Term, predicate: &Term, object: &Term)
    -> Result<TripleIter<'_>, GraphError>;

    /// Number of stored triples.
    fn size(&self) -> usize;

    /// Check if the store is empty.
    fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

/// Errors raised by a graph store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The store could not answer the lookup.
    Unavailable(String),
    /// A lock protecting the store was poisoned.
    LockPoisoned,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "graph unavailable: {message}"),
            Self::LockPoisoned => write!(f, "graph lock poisoned"),
        }
    }
}

impl std::error::Error for GraphError {}

/// The graphs a query runs against, keyed by block name.
///
/// A default graph answers every block name that has no explicit entry.
#[derive(Default)]
pub struct GraphArgs {
    default: Option<Arc<dyn Graph>>,
    named: HashMap<String, Arc<dyn Graph>>,
}

impl GraphArgs {
    /// Create an empty argument map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use one graph for every block.
    #[must_use]
    pub fn single(graph: Arc<dyn Graph>) -> Self {
        Self {
            default: Some(graph),
            named: HashMap::new(),
        }
    }

    /// Bind a graph to a block name.
    #[must_use]
    pub fn put(mut self, name: impl Into<String>, graph: Arc<dyn Graph>) -> Self {
        self.named.insert(name.into(), graph);
        self
    }

    /// Look up the graph for a block name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Graph>> {
        self.named.get(name).or(self.default.as_ref())
    }
}

impl fmt::Debug for GraphArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.named.keys().collect();
        names.sort();
        f.debug_struct("GraphArgs")
            .field("default", &self.default.is_some())
            .field("named", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_args_prefers_named() {
        let a: Arc<dyn Graph> = Arc::new(MemoryGraph::from_text("a p b").expect("graph"));
        let b: Arc<dyn Graph> = Arc::new(MemoryGraph::from_text("c p d; e p f").expect("graph"));
        let args = GraphArgs::single(a).put("other", b);

        assert_eq!(args.get("other").map(|g| g.size()), Some(2));
        assert_eq!(args.get(DEFAULT_GRAPH).map(|g| g.size()), Some(1));
        assert_eq!(args.get("unknown").map(|g| g.size()), Some(1));
    }

    #[test]
    fn test_graph_args_without_default() {
        let args = GraphArgs::new();
        assert!(args.get(DEFAULT_GRAPH).is_none());
    }

    #[test]
    fn test_graph_error_display() {
        assert_eq!(
            GraphError::Unavailable("disk gone".to_owned()).to_string(),
            "graph unavailable: disk gone"
        );
        assert_eq!(GraphError::LockPoisoned.to_string(), "graph lock poisoned");
    }
}
