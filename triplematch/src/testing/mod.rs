use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing_subscriber::EnvFilter;

use crate::graph::{Graph, GraphError, MemoryGraph, Term, TripleIter};

/// Install a fmt subscriber for test output.
///
/// Honours `RUST_LOG`; defaults to `triplematch=debug`. Safe to call from
/// every test, only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("triplematch=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Build a shared in-memory graph from `;`-separated triples.
#[allow(clippy::expect_used)]
pub fn graph_with(text: &str) -> Arc<dyn Graph> {
    Arc::new(MemoryGraph::from_text(text).expect("Test graph should parse"))
}

/// Wraps a graph and counts how often it is queried.
pub struct CountingGraph {
    inner: MemoryGraph,
    lookups: AtomicUsize,
}

impl CountingGraph {
    #[allow(clippy::expect_used)]
    pub fn new(text: &str) -> Self {
        Self {
            inner: MemoryGraph::from_text(text).expect("Test graph should parse"),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.lookups.store(0, Ordering::SeqCst);
    }
}

impl Graph for CountingGraph {
    fn find(
        &self,
        subject: &Term,
        predicate: &Term,
        object: &Term,
    ) -> Result<TripleIter<'_>, GraphError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find(subject, predicate, object)
    }

    fn size(&self) -> usize {
        self.inner.size()
    }
}

/// A graph whose every lookup fails.
pub struct FailingGraph {
    pub message: String,
}

impl FailingGraph {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_owned(),
        }
    }
}

impl Graph for FailingGraph {
    fn find(
        &self,
        _subject: &Term,
        _predicate: &Term,
        _object: &Term,
    ) -> Result<TripleIter<'_>, GraphError> {
        Err(GraphError::Unavailable(self.message.clone()))
    }

    fn size(&self) -> usize {
        0
    }
}

/// A graph whose lookups yield at most `good` matching triples and then
/// fail.
pub struct TruncatedGraph {
    inner: MemoryGraph,
    good: usize,
    message: String,
}

impl TruncatedGraph {
    #[allow(clippy::expect_used)]
    pub fn new(text: &str, good: usize, message: &str) -> Self {
        Self {
            inner: MemoryGraph::from_text(text).expect("Test graph should parse"),
            good,
            message: message.to_owned(),
        }
    }
}

impl Graph for TruncatedGraph {
    fn find(
        &self,
        subject: &Term,
        predicate: &Term,
        object: &Term,
    ) -> Result<TripleIter<'_>, GraphError> {
        let matches = self.inner.find(subject, predicate, object)?;
        let failure = GraphError::Unavailable(self.message.clone());
        Ok(Box::new(
            matches.take(self.good).chain(std::iter::once(Err(failure))),
        ))
    }

    fn size(&self) -> usize {
        self.inner.size()
    }
}
