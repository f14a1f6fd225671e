//! Selectivity-driven reordering of pattern blocks.
//!
//! The engine evaluates a block's triples depth-first in the order the
//! sorter returns, so putting cheap (well-constrained) triples first cuts
//! the number of store lookups. The order never affects which results are
//! produced.
//!
//! # Weights
//!
//! | Position                         | Weight |
//! |----------------------------------|--------|
//! | constant                         | 0      |
//! | variable bound by an earlier pick| 1      |
//! | unbound variable                 | 4      |
//! | wildcard                         | 5      |

use std::collections::HashSet;
use std::fmt::Debug;

use crate::graph::{Term, Triple};

/// Reorders the triples of one pattern block.
pub trait TripleSorter: Send + Sync + Debug {
    /// Return a permutation of `triples`.
    fn sort(&self, triples: &[Triple]) -> Vec<Triple>;
}

/// Greedy minimum-weight sorter. Ties keep input order.
#[derive(Debug, Default, Clone, Copy)]
pub struct WeightedTripleSorter;

/// The identity sorter.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsortedTripleSorter;

impl WeightedTripleSorter {
    fn term_weight(term: &Term, bound: &HashSet<&Term>) -> u32 {
        match term {
            Term::Any => 5,
            Term::Variable(_) if bound.contains(term) => 1,
            Term::Variable(_) => 4,
            _ => 0,
        }
    }

    /// The weight of a triple given the currently bound variables.
    #[must_use]
    pub fn weight(triple: &Triple, bound: &HashSet<&Term>) -> u32 {
        triple
            .terms()
            .iter()
            .map(|t| Self::term_weight(t, bound))
            .sum()
    }
}

impl TripleSorter for WeightedTripleSorter {
    fn sort(&self, triples: &[Triple]) -> Vec<Triple> {
        let mut remaining: Vec<&Triple> = triples.iter().collect();
        let mut bound: HashSet<&Term> = HashSet::new();
        let mut sorted = Vec::with_capacity(triples.len());

        while !remaining.is_empty() {
            let mut best = 0;
            let mut best_weight = u32::MAX;
            for (i, triple) in remaining.iter().enumerate() {
                let weight = Self::weight(triple, &bound);
                if weight < best_weight {
                    best = i;
                    best_weight = weight;
                }
            }
            let picked = remaining.remove(best);
            bound.extend(picked.variables());
            sorted.push(picked.clone());
        }
        sorted
    }
}

impl TripleSorter for UnsortedTripleSorter {
    fn sort(&self, triples: &[Triple]) -> Vec<Triple> {
        triples.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::triples;

    fn sorted(text: &str) -> Vec<String> {
        WeightedTripleSorter
            .sort(&triples(text).expect("triples"))
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_constants_first() {
        assert_eq!(
            sorted("?x p ?y; a p b; ?y q c"),
            vec!["a p b", "?y q c", "?x p ?y"]
        );
    }

    #[test]
    fn test_weights_recomputed_after_each_pick() {
        // After "?a X ?b" binds ?b, "?b Y ?c" (1+0+4) beats "?a ?? ?d" (1+5+4).
        assert_eq!(
            sorted("?a ?? ?d; ?a X ?b; ?b Y ?c"),
            vec!["?a X ?b", "?b Y ?c", "?a ?? ?d"]
        );
    }

    #[test]
    fn test_ties_keep_input_order() {
        assert_eq!(sorted("c p d; a p b; e p f"), vec!["c p d", "a p b", "e p f"]);
        assert_eq!(sorted("?x p ?y; ?z q ?w"), vec!["?x p ?y", "?z q ?w"]);
    }

    #[test]
    fn test_result_is_permutation() {
        let input = triples("?x p ?y; ?x p ?y; ?? q ?z; a ?r b").expect("triples");
        let mut output = WeightedTripleSorter.sort(&input);
        let mut expected = input;
        let key = |t: &Triple| t.to_string();
        output.sort_by_key(key);
        expected.sort_by_key(key);
        assert_eq!(output, expected);
    }

    #[test]
    fn test_unsorted_is_identity() {
        let input = triples("?x p ?y; a p b").expect("triples");
        assert_eq!(UnsortedTripleSorter.sort(&input), input);
    }

    #[test]
    fn test_weight_table() {
        let triple = Triple::parse("?x ?? ?y").expect("triple");
        let x = Term::var("x");
        let bound: HashSet<&Term> = [&x].into_iter().collect();
        assert_eq!(WeightedTripleSorter::weight(&triple, &bound), 1 + 5 + 4);
    }
}
