//! In-memory graph.
//!
//! Triples are kept in insertion order with one position index per slot
//! (subject, predicate, object). A lookup walks the shortest candidate list
//! among its indexed concrete positions and filters by value equality.
//!
//! # Invariants
//!
//! - No triple is stored twice (lexical identity)
//! - Every index entry points at a live position in `triples`

use std::collections::{HashMap, HashSet};

use super::term::{Term, Triple, TripleParseError, triples};
use super::{Graph, GraphError, TripleIter};

/// A simple indexed triple store.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    triples: Vec<Triple>,
    present: HashSet<Triple>,
    by_subject: HashMap<Term, Vec<usize>>,
    by_predicate: HashMap<Term, Vec<usize>>,
    by_object: HashMap<Term, Vec<usize>>,
}

impl MemoryGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `;`-separated triples in token syntax.
    ///
    /// # Errors
    ///
    /// Returns an error if an item is not exactly three tokens.
    pub fn from_text(text: &str) -> Result<Self, TripleParseError> {
        let mut graph = Self::new();
        graph.add_text(text)?;
        Ok(graph)
    }

    /// Add `;`-separated triples in token syntax.
    ///
    /// # Errors
    ///
    /// Returns an error if an item is not exactly three tokens.
    pub fn add_text(&mut self, text: &str) -> Result<(), TripleParseError> {
        for triple in triples(text)? {
            self.add(triple);
        }
        Ok(())
    }

    /// Add a triple. Returns false if it was already present.
    pub fn add(&mut self, triple: Triple) -> bool {
        if self.present.contains(&triple) {
            return false;
        }
        let position = self.triples.len();
        self.by_subject
            .entry(triple.subject.clone())
            .or_default()
            .push(position);
        self.by_predicate
            .entry(triple.predicate.clone())
            .or_default()
            .push(position);
        // Literal objects are matched by value, so they are not indexed.
        if !triple.object.is_literal() {
            self.by_object
                .entry(triple.object.clone())
                .or_default()
                .push(position);
        }
        self.present.insert(triple.clone());
        self.triples.push(triple);
        true
    }

    /// Check if a triple is present.
    #[must_use]
    pub fn contains(&self, triple: &Triple) -> bool {
        self.present.contains(triple)
    }

    /// Number of triples.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.triples.len()
    }

    /// Check if empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Iterate over all triples in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Pick the shortest index list for the lookup, if any position is indexed.
    fn candidates(&self, subject: &Term, predicate: &Term, object: &Term) -> Option<&[usize]> {
        const EMPTY: &[usize] = &[];
        let mut best: Option<&[usize]> = None;
        let lookups = [
            (subject, &self.by_subject),
            (predicate, &self.by_predicate),
            (object, &self.by_object),
        ];
        for (term, index) in lookups {
            if !term.is_concrete() || term.is_literal() {
                continue;
            }
            let list = index.get(term).map_or(EMPTY, Vec::as_slice);
            if best.is_none_or(|b| list.len() < b.len()) {
                best = Some(list);
            }
        }
        best
    }
}

fn position_matches(pattern: &Term, term: &Term) -> bool {
    !pattern.is_concrete() || pattern.same_value_as(term)
}

impl Graph for MemoryGraph {
    fn find(
        &self,
        subject: &Term,
        predicate: &Term,
        object: &Term,
    ) -> Result<TripleIter<'_>, GraphError> {
        let s = subject.clone();
        let p = predicate.clone();
        let o = object.clone();
        let keep = move |t: &&Triple| {
            position_matches(&s, &t.subject)
                && position_matches(&p, &t.predicate)
                && position_matches(&o, &t.object)
        };
        match self.candidates(subject, predicate, object) {
            Some(positions) => Ok(Box::new(
                positions
                    .iter()
                    .map(|&i| &self.triples[i])
                    .filter(keep)
                    .map(|t| Ok(t.clone())),
            )),
            None => Ok(Box::new(
                self.triples.iter().filter(keep).map(|t| Ok(t.clone())),
            )),
        }
    }

    fn size(&self) -> usize {
        self.triples.len()
    }
}
