//! Query types.
//!
//! This module defines the declarative query object:
//! - `Block` - A named group of triple patterns matched against one graph
//! - `Query` - Pattern blocks, a constraint conjunction and a triple sorter
//!
//! A `Query` is inert; [`Engine::prepare`](super::engine::Engine::prepare)
//! compiles it against a set of graphs and output variables.

use std::sync::Arc;

use crate::graph::{DEFAULT_GRAPH, MemoryGraph, Term, Triple};

use super::expression::{Expression, ExpressionSet};
use super::rewrite::rewrite;
use super::sorter::{TripleSorter, WeightedTripleSorter};

/// A group of triple patterns evaluated by one pattern stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// The graph name the block runs against.
    pub name: String,
    /// The patterns, in the order they were added.
    pub triples: Vec<Triple>,
}

/// A complete query.
#[derive(Debug, Clone)]
pub struct Query {
    /// Pattern blocks, in order of first use.
    blocks: Vec<Block>,
    /// Constraints, already rewritten and split into conjuncts.
    constraints: ExpressionSet,
    /// How each block is reordered before compilation.
    sorter: Arc<dyn TripleSorter>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            blocks: Vec::new(),
            constraints: ExpressionSet::new(),
            sorter: Arc::new(WeightedTripleSorter),
        }
    }
}

impl Query {
    /// Create a new empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a query whose patterns are every triple of `graph`.
    #[must_use]
    pub fn from_pattern_graph(graph: &MemoryGraph) -> Self {
        graph
            .iter()
            .fold(Self::new(), |query, triple| query.add_match_triple(triple.clone()))
    }

    /// Add a pattern to the default block.
    #[must_use]
    pub fn add_match(self, subject: Term, predicate: Term, object: Term) -> Self {
        self.add_match_triple(Triple::new(subject, predicate, object))
    }

    /// Add a pattern triple to the default block.
    #[must_use]
    pub fn add_match_triple(self, triple: Triple) -> Self {
        self.add_named_match(DEFAULT_GRAPH, triple)
    }

    /// Add a pattern to the block for `graph_name`, creating the block on
    /// first use.
    #[must_use]
    pub fn add_named_match(mut self, graph_name: &str, triple: Triple) -> Self {
        match self.blocks.iter_mut().find(|b| b.name == graph_name) {
            Some(block) => block.triples.push(triple),
            None => self.blocks.push(Block {
                name: graph_name.to_owned(),
                triples: vec![triple],
            }),
        }
        self
    }

    /// Add a constraint. String matches are rewritten into cheaper tests
    /// where possible and top-level conjunctions are split.
    #[must_use]
    pub fn add_constraint(mut self, expression: Expression) -> Self {
        self.constraints.add(rewrite(expression));
        self
    }

    /// Add the binary constraint `function(left, right)`.
    #[must_use]
    pub fn add_constraint_triple(self, left: Term, function: &str, right: Term) -> Self {
        self.add_constraint(Expression::apply(
            function,
            vec![Expression::term(left), Expression::term(right)],
        ))
    }

    /// Replace the triple sorter.
    #[must_use]
    pub fn set_triple_sorter(mut self, sorter: Arc<dyn TripleSorter>) -> Self {
        self.sorter = sorter;
        self
    }

    /// The pattern blocks.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The constraint conjunction.
    #[must_use]
    pub const fn constraints(&self) -> &ExpressionSet {
        &self.constraints
    }

    /// The triple sorter.
    #[must_use]
    pub fn sorter(&self) -> &dyn TripleSorter {
        self.sorter.as_ref()
    }

    /// Distinct variables across every block, in order of first
    /// occurrence.
    #[must_use]
    pub fn variables(&self) -> Vec<&Term> {
        let mut vars: Vec<&Term> = Vec::new();
        for triple in self.blocks.iter().flat_map(|b| &b.triples) {
            for var in triple.variables() {
                if !vars.contains(&var) {
                    vars.push(var);
                }
            }
        }
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::expression::{EQ, PatternLiteral, STARTS_WITH};
    use crate::query::sorter::UnsortedTripleSorter;

    fn triple(text: &str) -> Triple {
        Triple::parse(text).expect("triple")
    }

    #[test]
    fn test_default_block() {
        let query = Query::new()
            .add_match(Term::var("x"), Term::from_token("p"), Term::var("y"))
            .add_match_triple(triple("?y q ?z"));
        assert_eq!(query.blocks().len(), 1);
        assert_eq!(query.blocks()[0].name, DEFAULT_GRAPH);
        assert_eq!(query.blocks()[0].triples.len(), 2);
    }

    #[test]
    fn test_named_blocks_in_first_use_order() {
        let query = Query::new()
            .add_named_match("b", triple("?x p ?y"))
            .add_named_match("a", triple("?y p ?z"))
            .add_named_match("b", triple("?z p ?w"));
        let names: Vec<&str> = query.blocks().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(query.blocks()[0].triples.len(), 2);
    }

    #[test]
    fn test_constraints_rewritten_and_split() {
        let query = Query::new().add_constraint(Expression::and(
            Expression::matches(
                Expression::token("?x"),
                Expression::Pattern(PatternLiteral::rdql("^a", "")),
            ),
            Expression::eq(Expression::token("?x"), Expression::token("?y")),
        ));
        let functions: Vec<Option<&str>> =
            query.constraints().iter().map(Expression::function).collect();
        assert_eq!(functions, vec![Some(STARTS_WITH), Some(EQ)]);
    }

    #[test]
    fn test_constraint_triple() {
        let query = Query::new().add_constraint_triple(Term::var("x"), EQ, Term::from_token("a"));
        assert_eq!(
            query.constraints().iter().next(),
            Some(&Expression::eq(Expression::token("?x"), Expression::token("a")))
        );
    }

    #[test]
    fn test_from_pattern_graph() {
        let graph = MemoryGraph::from_text("_a p _b; _b q c").expect("graph");
        let query = Query::from_pattern_graph(&graph);
        assert_eq!(query.blocks()[0].triples, graph.iter().cloned().collect::<Vec<_>>());
    }

    #[test]
    fn test_sorter_replacement_and_variables() {
        let query = Query::new()
            .add_match_triple(triple("?x p ?y"))
            .add_match_triple(triple("?y q ?x"))
            .set_triple_sorter(Arc::new(UnsortedTripleSorter));
        let input = query.blocks()[0].triples.clone();
        assert_eq!(query.sorter().sort(&input), input);
        assert_eq!(query.variables(), vec![&Term::var("x"), &Term::var("y")]);
    }
}
