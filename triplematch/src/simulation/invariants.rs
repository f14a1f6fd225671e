//! Invariant checking for simulated queries.
//!
//! Results are compared as multisets of rendered rows, since the pipeline
//! makes no promise about order.

use std::collections::HashMap;

use crate::graph::Triple;
use crate::query::Domain;

/// A detected invariant violation.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Which invariant failed.
    pub description: String,
    /// Index of the query within the run.
    pub query_index: usize,
    /// Additional context for debugging.
    pub context: String,
}

fn counts(rows: &[Domain]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for row in rows {
        *counts.entry(row.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Rows present in `left` more often than in `right`.
fn surplus(left: &HashMap<String, usize>, right: &HashMap<String, usize>) -> Vec<String> {
    let mut extra: Vec<String> = left
        .iter()
        .filter(|(row, n)| right.get(*row).copied().unwrap_or(0) < **n)
        .map(|(row, _)| row.clone())
        .collect();
    extra.sort();
    extra
}

/// Collects invariant violations over a run.
#[derive(Debug, Default)]
pub struct InvariantChecker {
    violations: Vec<InvariantViolation>,
}

impl InvariantChecker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every engine row must be a reference row (soundness) and every
    /// reference row must be produced (completeness), with multiplicity.
    pub fn check_results(
        &mut self,
        engine: &[Domain],
        reference: &[Domain],
        query_index: usize,
        context: &str,
    ) {
        let produced = counts(engine);
        let expected = counts(reference);

        let unsound = surplus(&produced, &expected);
        if !unsound.is_empty() {
            self.add_violation(InvariantViolation {
                description: format!("Engine produced unexpected rows: {unsound:?}"),
                query_index,
                context: context.to_owned(),
            });
        }

        let missing = surplus(&expected, &produced);
        if !missing.is_empty() {
            self.add_violation(InvariantViolation {
                description: format!("Engine missed rows: {missing:?}"),
                query_index,
                context: context.to_owned(),
            });
        }
    }

    /// A sorter must return a permutation of its input.
    pub fn check_permutation(&mut self, input: &[Triple], sorted: &[Triple], query_index: usize) {
        let mut remaining: Vec<&Triple> = input.iter().collect();
        let is_permutation = sorted.len() == input.len()
            && sorted.iter().all(|t| {
                remaining
                    .iter()
                    .position(|r| *r == t)
                    .map(|i| remaining.swap_remove(i))
                    .is_some()
            });
        if !is_permutation {
            self.add_violation(InvariantViolation {
                description: "Sorted block is not a permutation of its input".to_owned(),
                query_index,
                context: format!("input: {input:?}, sorted: {sorted:?}"),
            });
        }
    }

    /// Results must not depend on the triple sorter.
    pub fn check_sorter_independence(
        &mut self,
        sorted: &[Domain],
        unsorted: &[Domain],
        query_index: usize,
    ) {
        let a = counts(sorted);
        let b = counts(unsorted);
        if a != b {
            self.add_violation(InvariantViolation {
                description: "Results differ between weighted and unsorted plans".to_owned(),
                query_index,
                context: format!(
                    "weighted only: {:?}, unsorted only: {:?}",
                    surplus(&a, &b),
                    surplus(&b, &a)
                ),
            });
        }
    }

    pub fn add_violation(&mut self, violation: InvariantViolation) {
        self.violations.push(violation);
    }

    #[must_use]
    pub fn violations(&self) -> &[InvariantViolation] {
        &self.violations
    }

    #[must_use]
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }
}
