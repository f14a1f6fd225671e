//! Binding tuples.
//!
//! A `Domain` holds the terms currently bound for one candidate answer,
//! one slot per query variable (see [`Mapping`](super::mapping::Mapping)).
//!
//! # Copy-on-extend
//!
//! A domain handed downstream is never mutated again: a pattern stage
//! copies the domain for every candidate triple and only writes into the
//! copy.

use std::fmt;

use crate::graph::Term;

/// A fixed-width tuple of optional terms.
#[derive(Debug, Default, PartialEq, Eq, Hash)]
pub struct Domain {
    slots: Vec<Option<Term>>,
}

impl Domain {
    /// Create a domain with `width` unset slots.
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            slots: vec![None; width],
        }
    }

    /// Create a domain from explicit slot values.
    #[must_use]
    pub const fn from_slots(slots: Vec<Option<Term>>) -> Self {
        Self { slots }
    }

    /// Number of slots.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.slots.len()
    }

    /// The term in slot `index`, if set.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Term> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Set slot `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range; slot indexes come from the
    /// query's own mapping, so this is a compilation bug.
    pub fn set(&mut self, index: usize, term: Term) {
        self.slots[index] = Some(term);
    }

    /// Check if slot `index` is set.
    #[must_use]
    pub fn is_set(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Create an independent copy of this domain.
    ///
    /// This is used instead of Clone to comply with project policy.
    #[must_use]
    pub fn copy(&self) -> Self {
        Self {
            slots: self.slots.iter().map(|slot| slot.as_ref().map(Term::clone)).collect(),
        }
    }

    /// Build a new domain holding the given slots of this one, in order.
    #[must_use]
    pub fn project(&self, indices: &[usize]) -> Self {
        Self {
            slots: indices.iter().map(|&i| self.get(i).cloned()).collect(),
        }
    }

    /// Iterate over the slots.
    pub fn iter(&self) -> impl Iterator<Item = Option<&Term>> {
        self.slots.iter().map(Option::as_ref)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, slot) in self.slots.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match slot {
                Some(term) => write!(f, "{term}")?,
                None => write!(f, "-")?,
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_domain_is_unset() {
        let domain = Domain::new(3);
        assert_eq!(domain.size(), 3);
        assert!((0..3).all(|i| !domain.is_set(i)));
        assert!(domain.get(7).is_none());
    }

    #[test]
    fn test_copy_is_independent() {
        let mut original = Domain::new(2);
        original.set(0, Term::from_token("a"));

        let mut copy = original.copy();
        copy.set(1, Term::from_token("b"));

        assert_eq!(original.get(1), None);
        assert_eq!(copy.get(0), Some(&Term::from_token("a")));
        assert_eq!(copy.get(1), Some(&Term::from_token("b")));
    }

    #[test]
    fn test_project_reorders() {
        let domain = Domain::from_slots(vec![
            Some(Term::from_token("x")),
            None,
            Some(Term::from_token("z")),
        ]);
        let projected = domain.project(&[2, 1, 0]);
        assert_eq!(projected.to_string(), "[z, -, x]");
    }
}
