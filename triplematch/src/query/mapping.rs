//! Variable to slot mapping.
//!
//! A `Mapping` assigns every query variable a fixed slot in the
//! [`Domain`](super::domain::Domain). Output variables are pre-declared so
//! they receive the lowest slots, in the caller's order; the rest are
//! allocated as patterns are compiled.
//!
//! # Invariants
//!
//! - The mapping is injective: distinct variables never share a slot
//! - Slots are dense: `0..size()` are all assigned
//! - A pre-declared variable is mapped but not *bound* until a pattern
//!   binds it

use std::collections::{HashMap, HashSet};

use crate::graph::Term;

use super::error::QueryError;

/// Injective variable → slot table.
#[derive(Debug, Default)]
pub struct Mapping {
    slots: HashMap<Term, usize>,
    order: Vec<Term>,
    bound: HashSet<Term>,
}

impl Mapping {
    /// Create an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mapping with the given output variables pre-declared.
    ///
    /// A variable listed twice keeps its first slot.
    ///
    /// # Errors
    ///
    /// Returns `NotAVariable` if any output is not a variable.
    pub fn with_outputs(outputs: &[Term]) -> Result<Self, QueryError> {
        let mut mapping = Self::new();
        for output in outputs {
            if !output.is_variable() {
                return Err(QueryError::NotAVariable(output.clone()));
            }
            if !mapping.slots.contains_key(output) {
                mapping.allocate(output);
            }
        }
        Ok(mapping)
    }

    fn allocate(&mut self, variable: &Term) -> usize {
        let index = self.order.len();
        self.slots.insert(variable.clone(), index);
        self.order.push(variable.clone());
        index
    }

    /// Bind a variable, returning its slot.
    ///
    /// A pre-declared variable is marked bound and keeps its slot; an
    /// unseen one gets the next free slot.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateBinding` if a pattern already bound the variable,
    /// or `NotAVariable` for a non-variable term.
    pub fn new_index(&mut self, variable: &Term) -> Result<usize, QueryError> {
        if !variable.is_variable() {
            return Err(QueryError::NotAVariable(variable.clone()));
        }
        if self.bound.contains(variable) {
            return Err(QueryError::DuplicateBinding(variable.clone()));
        }
        let index = match self.slots.get(variable) {
            Some(&index) => index,
            None => self.allocate(variable),
        };
        self.bound.insert(variable.clone());
        Ok(index)
    }

    /// Check if a pattern has bound this variable.
    #[must_use]
    pub fn has_bound(&self, variable: &Term) -> bool {
        self.bound.contains(variable)
    }

    /// The slot of a mapped variable.
    ///
    /// # Errors
    ///
    /// Returns `UnboundVariable` if the variable has no slot.
    pub fn index_of(&self, variable: &Term) -> Result<usize, QueryError> {
        self.slots
            .get(variable)
            .copied()
            .ok_or_else(|| QueryError::UnboundVariable(variable.clone()))
    }

    /// Number of slots.
    #[must_use]
    pub fn size(&self) -> usize {
        self.order.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_index_allocates_dense_slots() {
        let mut mapping = Mapping::new();
        assert_eq!(mapping.new_index(&Term::var("x")).expect("x"), 0);
        assert_eq!(mapping.new_index(&Term::var("y")).expect("y"), 1);
        assert_eq!(mapping.size(), 2);
        assert_eq!(mapping.index_of(&Term::var("y")).expect("y"), 1);
    }

    #[test]
    fn test_outputs_take_lowest_slots() {
        let mut mapping = Mapping::with_outputs(&[Term::var("z"), Term::var("x")]).expect("outputs");
        assert!(!mapping.has_bound(&Term::var("x")));
        assert_eq!(mapping.new_index(&Term::var("y")).expect("y"), 2);
        assert_eq!(mapping.new_index(&Term::var("x")).expect("x"), 1);
        assert!(mapping.has_bound(&Term::var("x")));
        assert_eq!(mapping.size(), 3);
    }

    #[test]
    fn test_duplicate_binding_rejected() {
        let mut mapping = Mapping::new();
        mapping.new_index(&Term::var("x")).expect("first");
        assert_eq!(
            mapping.new_index(&Term::var("x")),
            Err(QueryError::DuplicateBinding(Term::var("x")))
        );
    }

    #[test]
    fn test_index_of_unmapped() {
        let mapping = Mapping::new();
        assert_eq!(
            mapping.index_of(&Term::var("nope")),
            Err(QueryError::UnboundVariable(Term::var("nope")))
        );
    }

    #[test]
    fn test_outputs_must_be_variables() {
        let result = Mapping::with_outputs(&[Term::uri("eh:/a")]);
        assert_eq!(result.err(), Some(QueryError::NotAVariable(Term::uri("eh:/a"))));
    }

    #[test]
    fn test_repeated_output_shares_slot() {
        let mapping = Mapping::with_outputs(&[Term::var("x"), Term::var("x")]).expect("outputs");
        assert_eq!(mapping.size(), 1);
    }
}
