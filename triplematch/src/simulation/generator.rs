//! Reproducible random graphs and queries.
//!
//! Graphs are drawn over a small vocabulary of nodes and predicates so that
//! random patterns join often. Queries mix variables, constants and the
//! wildcard, and sometimes carry `q:eq` / `q:ne` constraints over their own
//! variables.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::graph::{MemoryGraph, Term, Triple};
use crate::query::expression::{EQ, NE};

/// Configuration for workload generation.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Number of distinct node URIs.
    pub nodes: usize,
    /// Number of distinct predicate URIs.
    pub predicates: usize,
    /// Triples drawn per graph (duplicates collapse).
    pub triples: usize,
    /// Maximum patterns per query.
    pub max_patterns: usize,
    /// Number of distinct variable names.
    pub variables: usize,
    /// Probability that a pattern position is a variable.
    pub variable_rate: f64,
    /// Probability that a pattern position is the wildcard.
    pub wildcard_rate: f64,
    /// Probability that a query carries a constraint.
    pub constraint_rate: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            nodes: 6,
            predicates: 3,
            triples: 24,
            max_patterns: 3,
            variables: 4,
            variable_rate: 0.6,
            wildcard_rate: 0.05,
            constraint_rate: 0.4,
        }
    }
}

/// A binary constraint `function(left, right)`.
#[derive(Debug, Clone)]
pub struct GeneratedConstraint {
    pub left: Term,
    pub function: &'static str,
    pub right: Term,
}

/// A random query and the outputs it asks for.
#[derive(Debug, Clone)]
pub struct GeneratedQuery {
    pub patterns: Vec<Triple>,
    pub constraints: Vec<GeneratedConstraint>,
    pub outputs: Vec<Term>,
}

impl GeneratedQuery {
    /// Distinct pattern variables, in order of first occurrence.
    #[must_use]
    pub fn variables(&self) -> Vec<Term> {
        let mut vars: Vec<Term> = Vec::new();
        for triple in &self.patterns {
            for var in triple.variables() {
                if !vars.contains(var) {
                    vars.push(var.clone());
                }
            }
        }
        vars
    }
}

/// Seeded generator for graphs and queries.
#[derive(Debug)]
pub struct WorkloadGenerator {
    rng: StdRng,
    config: GeneratorConfig,
}

impl WorkloadGenerator {
    /// Create a generator with the default configuration.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, GeneratorConfig::default())
    }

    /// Create a generator with a custom configuration.
    #[must_use]
    pub fn with_config(seed: u64, config: GeneratorConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            config,
        }
    }

    fn node(&mut self) -> Term {
        let n = self.rng.random_range(0..self.config.nodes.max(1));
        Term::uri(&format!("eh:/n{n}"))
    }

    fn predicate(&mut self) -> Term {
        let p = self.rng.random_range(0..self.config.predicates.max(1));
        Term::uri(&format!("eh:/p{p}"))
    }

    fn variable(&mut self) -> Term {
        let v = self.rng.random_range(0..self.config.variables.max(1));
        Term::var(&format!("v{v}"))
    }

    /// Draw a random graph.
    pub fn random_graph(&mut self) -> MemoryGraph {
        let mut graph = MemoryGraph::new();
        for _ in 0..self.config.triples {
            let triple = Triple::new(self.node(), self.predicate(), self.node());
            graph.add(triple);
        }
        graph
    }

    fn position(&mut self, constant: fn(&mut Self) -> Term) -> Term {
        let roll = self.rng.random::<f64>();
        if roll < self.config.wildcard_rate {
            Term::Any
        } else if roll < self.config.wildcard_rate + self.config.variable_rate {
            self.variable()
        } else {
            constant(self)
        }
    }

    /// Draw a random query.
    pub fn random_query(&mut self) -> GeneratedQuery {
        let count = self.rng.random_range(1..=self.config.max_patterns.max(1));
        let patterns: Vec<Triple> = (0..count)
            .map(|_| {
                Triple::new(
                    self.position(Self::node),
                    self.position(Self::predicate),
                    self.position(Self::node),
                )
            })
            .collect();

        let mut query = GeneratedQuery {
            patterns,
            constraints: Vec::new(),
            outputs: Vec::new(),
        };
        let variables = query.variables();

        if !variables.is_empty() && self.rng.random::<f64>() < self.config.constraint_rate {
            let left = variables[self.rng.random_range(0..variables.len())].clone();
            let right = if self.rng.random_bool(0.5) {
                variables[self.rng.random_range(0..variables.len())].clone()
            } else {
                self.node()
            };
            let function = if self.rng.random_bool(0.5) { EQ } else { NE };
            query.constraints.push(GeneratedConstraint {
                left,
                function,
                right,
            });
        }

        query.outputs = variables
            .into_iter()
            .filter(|_| self.rng.random_bool(0.7))
            .collect();
        if self.rng.random_bool(0.1) {
            query.outputs.push(Term::var("unbound"));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_workload() {
        let mut a = WorkloadGenerator::new(42);
        let mut b = WorkloadGenerator::new(42);

        let ga: Vec<String> = a.random_graph().iter().map(ToString::to_string).collect();
        let gb: Vec<String> = b.random_graph().iter().map(ToString::to_string).collect();
        assert_eq!(ga, gb);

        for _ in 0..10 {
            let qa = a.random_query();
            let qb = b.random_query();
            assert_eq!(qa.patterns, qb.patterns);
            assert_eq!(qa.outputs, qb.outputs);
        }
    }

    #[test]
    fn test_constraints_only_mention_pattern_variables() {
        let mut generator = WorkloadGenerator::new(7);
        for _ in 0..100 {
            let query = generator.random_query();
            let vars = query.variables();
            for c in &query.constraints {
                assert!(vars.contains(&c.left));
                assert!(!c.right.is_variable() || vars.contains(&c.right));
            }
            assert!(!query.patterns.is_empty());
        }
    }
}
