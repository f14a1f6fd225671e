//! Naive reference evaluator.
//!
//! Enumerates every combination of stored triples, one per pattern, in the
//! order the patterns were written, and keeps the combinations whose
//! bindings agree and satisfy the constraints. No sorting, indexing or
//! pipelining: slow, but obviously correct.

use std::collections::HashMap;

use crate::graph::{MemoryGraph, Term, Triple};
use crate::query::Domain;
use crate::query::expression::EQ;

use super::generator::{GeneratedConstraint, GeneratedQuery};

type Bindings = HashMap<Term, Term>;

fn unify(pattern: &Term, term: &Term, bindings: &mut Bindings) -> bool {
    match pattern {
        Term::Any => true,
        Term::Variable(_) => match bindings.get(pattern) {
            Some(bound) => bound.same_value_as(term),
            None => {
                bindings.insert(pattern.clone(), term.clone());
                true
            }
        },
        constant => constant.same_value_as(term),
    }
}

fn unify_triple(pattern: &Triple, triple: &Triple, bindings: &Bindings) -> Option<Bindings> {
    let mut extended = bindings.clone();
    let ok = unify(&pattern.subject, &triple.subject, &mut extended)
        && unify(&pattern.predicate, &triple.predicate, &mut extended)
        && unify(&pattern.object, &triple.object, &mut extended);
    ok.then_some(extended)
}

fn resolve<'a>(term: &'a Term, bindings: &'a Bindings) -> Option<&'a Term> {
    if term.is_variable() {
        bindings.get(term)
    } else {
        Some(term)
    }
}

fn satisfies(constraint: &GeneratedConstraint, bindings: &Bindings) -> bool {
    match (
        resolve(&constraint.left, bindings),
        resolve(&constraint.right, bindings),
    ) {
        (Some(left), Some(right)) => left.same_value_as(right) == (constraint.function == EQ),
        _ => false,
    }
}

fn solve(graph: &MemoryGraph, patterns: &[Triple], bindings: &Bindings, out: &mut Vec<Bindings>) {
    let Some((first, rest)) = patterns.split_first() else {
        out.push(bindings.clone());
        return;
    };
    for triple in graph.iter() {
        if let Some(extended) = unify_triple(first, triple, bindings) {
            solve(graph, rest, &extended, out);
        }
    }
}

/// Evaluate a generated query, projecting each solution onto its outputs.
#[must_use]
pub fn reference_bindings(graph: &MemoryGraph, query: &GeneratedQuery) -> Vec<Domain> {
    let mut solutions = Vec::new();
    solve(graph, &query.patterns, &Bindings::new(), &mut solutions);
    solutions
        .into_iter()
        .filter(|b| query.constraints.iter().all(|c| satisfies(c, b)))
        .map(|b| {
            Domain::from_slots(
                query
                    .outputs
                    .iter()
                    .map(|output| b.get(output).cloned())
                    .collect(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{terms, triples};
    use crate::query::expression::NE;

    fn rows(graph: &str, patterns: &str, outputs: &str) -> Vec<String> {
        let graph = MemoryGraph::from_text(graph).expect("graph");
        let query = GeneratedQuery {
            patterns: triples(patterns).expect("patterns"),
            constraints: Vec::new(),
            outputs: terms(outputs),
        };
        let mut rows: Vec<String> = reference_bindings(&graph, &query)
            .iter()
            .map(ToString::to_string)
            .collect();
        rows.sort();
        rows
    }

    #[test]
    fn test_reference_join() {
        assert_eq!(
            rows("a p b; b q c; b q d", "?x p ?y; ?y q ?z", "?x ?z"),
            vec!["[a, c]", "[a, d]"]
        );
    }

    #[test]
    fn test_reference_repeated_variable() {
        assert_eq!(rows("a p a; a p b", "?x p ?x", "?x"), vec!["[a]"]);
    }

    #[test]
    fn test_reference_constraint() {
        let graph = MemoryGraph::from_text("a p b; a p c").expect("graph");
        let query = GeneratedQuery {
            patterns: triples("?x p ?y").expect("patterns"),
            constraints: vec![GeneratedConstraint {
                left: Term::var("y"),
                function: NE,
                right: Term::from_token("c"),
            }],
            outputs: terms("?y"),
        };
        let rows: Vec<String> = reference_bindings(&graph, &query)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(rows, vec!["[b]"]);
    }
}
