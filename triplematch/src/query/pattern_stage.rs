//! Pattern matching stage.
//!
//! For each incoming domain the stage joins its block of compiled triples
//! depth-first: query the store for triple `i` under the current bindings,
//! extend a copy of the domain with each matching candidate, check the
//! guards placed at `i`, and recurse into triple `i + 1`. A domain that
//! survives the last triple is sent downstream. No intermediate result set
//! is materialised.
//!
//! # Cancellation
//!
//! The stage's open flag is checked before reading each input domain and
//! before every store lookup.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::graph::Graph;

use super::domain::Domain;
use super::element::QueryTriple;
use super::error::QueryError;
use super::pipe::{PipeReceiver, PipeSender};
use super::stage::{Stage, StageContext, StageState, Upstream};
use super::valuator::ValuatorSet;

/// Matches one block of triple patterns against a graph.
#[derive(Debug)]
pub struct PatternStage {
    upstream: Upstream,
    matcher: Matcher,
}

struct Matcher {
    graph: Arc<dyn Graph>,
    triples: Vec<QueryTriple>,
    /// One guard set per triple, evaluated right after it matches.
    guards: Vec<ValuatorSet>,
    state: Arc<StageState>,
}

impl PatternStage {
    /// Create a stage for a compiled, sorted block.
    ///
    /// `guards` may be shorter than `triples`; missing positions get no
    /// guard.
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        graph: Arc<dyn Graph>,
        triples: Vec<QueryTriple>,
        mut guards: Vec<ValuatorSet>,
    ) -> Self {
        guards.resize_with(triples.len(), ValuatorSet::new);
        Self {
            upstream: Upstream::default(),
            matcher: Matcher {
                graph,
                triples,
                guards,
                state: StageState::new(label),
            },
        }
    }

    /// Wire the stage that feeds this one.
    pub fn connect_from(&mut self, previous: Box<dyn Stage>) {
        self.upstream.connect(previous);
    }
}

impl Stage for PatternStage {
    fn state(&self) -> Arc<StageState> {
        Arc::clone(&self.matcher.state)
    }

    fn deliver(
        self: Box<Self>,
        sink: PipeSender,
        context: &StageContext<'_>,
    ) -> Result<(), QueryError> {
        let Self { upstream, matcher } = *self;
        let input = upstream.deliver("pattern", context)?;
        context.spawn(Arc::clone(&matcher.state), sink, move |sink| {
            matcher.run(input, sink)
        });
        Ok(())
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("graph_size", &self.graph.size())
            .field("triples", &self.triples)
            .field("guards", &self.guards)
            .field("state", &self.state)
            .finish()
    }
}

impl Matcher {
    fn run(&self, mut input: PipeReceiver, sink: &PipeSender) -> Result<(), QueryError> {
        while self.state.is_open() && input.has_next()? {
            let domain = input.get()?;
            self.extend(0, domain, sink)?;
        }
        Ok(())
    }

    fn extend(&self, index: usize, domain: Domain, sink: &PipeSender) -> Result<(), QueryError> {
        let Some(triple) = self.triples.get(index) else {
            return sink.put(domain);
        };
        if !self.state.is_open() {
            return Ok(());
        }

        let [subject, predicate, object] = triple.lookup(&domain);
        trace!(
            stage = self.state.label(),
            index,
            %subject,
            %predicate,
            %object,
            "Probing graph"
        );
        for candidate in self.graph.find(&subject, &predicate, &object)? {
            let candidate = candidate?;
            let mut extended = domain.copy();
            if triple.matches(&mut extended, &candidate)
                && self.guards[index].evaluate_all(&extended)?
            {
                self.extend(index + 1, extended, sink)?;
            }
        }
        Ok(())
    }
}
