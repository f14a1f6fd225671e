//! Tree queries.
//!
//! A tree query is written as a graph: its blank nodes stand for unknowns.
//! The answer is the graph of every instantiation of the pattern triples
//! over all solutions, i.e. the subgraph of the store that the pattern
//! matches.

use std::sync::Arc;

use crate::graph::{Graph, MemoryGraph, Term, Triple};

use super::domain::Domain;
use super::engine::Engine;
use super::error::QueryError;
use super::types::Query;

fn as_pattern_term(term: &Term) -> Term {
    match term {
        Term::Blank(label) => Term::var(&format!("_:{label}")),
        other => other.clone(),
    }
}

fn as_pattern(triple: &Triple) -> Triple {
    Triple::new(
        as_pattern_term(&triple.subject),
        as_pattern_term(&triple.predicate),
        as_pattern_term(&triple.object),
    )
}

fn instantiate(term: &Term, variables: &[Term], row: &Domain) -> Term {
    variables
        .iter()
        .position(|v| v == term)
        .and_then(|i| row.get(i))
        .map_or_else(|| term.clone(), Term::clone)
}

impl Engine {
    /// Match a pattern graph whose blank nodes act as variables and return
    /// the matched subgraph of `graph`.
    ///
    /// # Errors
    ///
    /// Returns any compilation or execution error of the underlying
    /// binding query.
    pub fn execute_tree(
        &self,
        graph: Arc<dyn Graph>,
        pattern: &MemoryGraph,
    ) -> Result<MemoryGraph, QueryError> {
        let patterns: Vec<Triple> = pattern.iter().map(as_pattern).collect();
        let query = patterns
            .iter()
            .fold(Query::new(), |query, t| query.add_match_triple(t.clone()));
        let variables: Vec<Term> = query.variables().into_iter().cloned().collect();

        let mut matched = MemoryGraph::new();
        for row in self.execute_bindings(&query, graph, &variables)? {
            let row = row?;
            for triple in &patterns {
                matched.add(Triple::new(
                    instantiate(&triple.subject, &variables, &row),
                    instantiate(&triple.predicate, &variables, &row),
                    instantiate(&triple.object, &variables, &row),
                ));
            }
        }
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn sorted(graph: &MemoryGraph) -> Vec<String> {
        let mut triples: Vec<String> = graph.iter().map(ToString::to_string).collect();
        triples.sort();
        triples
    }

    #[test]
    fn test_tree_query_returns_matched_subgraph() {
        let engine = Engine::new(EngineConfig::default()).expect("engine");
        let data: Arc<dyn Graph> = Arc::new(
            MemoryGraph::from_text("a pings b; b pings c; c pongs d; x pings y").expect("data"),
        );
        let pattern = MemoryGraph::from_text("_x pings _y; _y pings _z").expect("pattern");

        let result = engine.execute_tree(data, &pattern).expect("tree");
        assert_eq!(sorted(&result), vec!["a pings b", "b pings c"]);
    }

    #[test]
    fn test_tree_query_without_match_is_empty() {
        let engine = Engine::new(EngineConfig::default()).expect("engine");
        let data: Arc<dyn Graph> = Arc::new(MemoryGraph::from_text("a p b").expect("data"));
        let pattern = MemoryGraph::from_text("_x q _y").expect("pattern");
        assert!(engine.execute_tree(data, &pattern).expect("tree").is_empty());
    }
}
