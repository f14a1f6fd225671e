//! Compiled pattern positions.
//!
//! Every term of a triple pattern compiles to one of four [`Element`]s,
//! relative to the query's [`Mapping`](super::mapping::Mapping). A
//! [`QueryTriple`] bundles three of them and knows how to query the store
//! and how to match a candidate triple against a binding tuple.

use std::fmt;

use crate::graph::{Term, Triple};

use super::domain::Domain;

/// One compiled position of a triple pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// A constant term; the candidate must be value-equal to it.
    Fixed(Term),
    /// First occurrence of a variable: the candidate's term is written into
    /// the slot.
    Bind(usize),
    /// Repeat occurrence: the candidate must be value-equal to the slot.
    Bound(usize),
    /// The wildcard; matches anything.
    Any,
}

impl Element {
    /// Match one position, writing into `domain` for `Bind`.
    fn matches(&self, domain: &mut Domain, term: &Term) -> bool {
        match self {
            Self::Fixed(fixed) => fixed.same_value_as(term),
            Self::Bind(slot) => {
                domain.set(*slot, term.clone());
                true
            }
            Self::Bound(slot) => domain.get(*slot).is_some_and(|value| value.same_value_as(term)),
            Self::Any => true,
        }
    }

    /// The term to send to the store for this position.
    fn lookup(&self, domain: &Domain) -> Term {
        match self {
            Self::Fixed(term) => term.clone(),
            Self::Bound(slot) => domain.get(*slot).cloned().unwrap_or(Term::Any),
            Self::Bind(_) | Self::Any => Term::Any,
        }
    }

    /// The slot written by this element, if it binds one.
    #[must_use]
    pub const fn binds(&self) -> Option<usize> {
        match self {
            Self::Bind(slot) => Some(*slot),
            _ => None,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(term) => write!(f, "{term}"),
            Self::Bind(slot) => write!(f, "bind({slot})"),
            Self::Bound(slot) => write!(f, "bound({slot})"),
            Self::Any => write!(f, "??"),
        }
    }
}

/// A compiled triple pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTriple {
    /// Subject position.
    pub subject: Element,
    /// Predicate position.
    pub predicate: Element,
    /// Object position.
    pub object: Element,
}

impl QueryTriple {
    /// Create a compiled triple.
    #[must_use]
    pub const fn new(subject: Element, predicate: Element, object: Element) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Build the store lookup for this triple under the given bindings.
    #[must_use]
    pub fn lookup(&self, domain: &Domain) -> [Term; 3] {
        [
            self.subject.lookup(domain),
            self.predicate.lookup(domain),
            self.object.lookup(domain),
        ]
    }

    /// Match a candidate triple, extending `domain` in place.
    ///
    /// Positions are checked subject → predicate → object, so a variable
    /// repeated within the triple is compared against the value bound by
    /// its earlier position. On failure `domain` may be partially written
    /// and must be discarded.
    pub fn matches(&self, domain: &mut Domain, triple: &Triple) -> bool {
        self.subject.matches(domain, &triple.subject)
            && self.predicate.matches(domain, &triple.predicate)
            && self.object.matches(domain, &triple.object)
    }

    /// The three elements in subject, predicate, object order.
    #[must_use]
    pub const fn elements(&self) -> [&Element; 3] {
        [&self.subject, &self.predicate, &self.object]
    }
}

impl fmt::Display for QueryTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(text: &str) -> Triple {
        Triple::parse(text).expect("triple")
    }

    #[test]
    fn test_bind_then_bound_in_same_triple() {
        // ?x p ?x
        let pattern = QueryTriple::new(
            Element::Bind(0),
            Element::Fixed(Term::from_token("p")),
            Element::Bound(0),
        );

        let mut domain = Domain::new(1);
        assert!(pattern.matches(&mut domain, &triple("a p a")));
        assert_eq!(domain.get(0), Some(&Term::from_token("a")));

        let mut domain = Domain::new(1);
        assert!(!pattern.matches(&mut domain, &triple("a p b")));
    }

    #[test]
    fn test_fixed_uses_value_equality() {
        let pattern = QueryTriple::new(
            Element::Any,
            Element::Any,
            Element::Fixed(Term::from_token("'01'^^xsd:integer")),
        );
        let mut domain = Domain::new(0);
        assert!(pattern.matches(&mut domain, &triple("a p 1")));
    }

    #[test]
    fn test_lookup_uses_bound_values() {
        let pattern = QueryTriple::new(
            Element::Bound(0),
            Element::Fixed(Term::from_token("p")),
            Element::Bind(1),
        );
        let mut domain = Domain::new(2);
        assert_eq!(
            pattern.lookup(&domain),
            [Term::Any, Term::from_token("p"), Term::Any]
        );

        domain.set(0, Term::from_token("a"));
        assert_eq!(
            pattern.lookup(&domain),
            [Term::from_token("a"), Term::from_token("p"), Term::Any]
        );
    }

    #[test]
    fn test_bound_fails_on_unset_slot() {
        let pattern = QueryTriple::new(Element::Bound(0), Element::Any, Element::Any);
        let mut domain = Domain::new(1);
        assert!(!pattern.matches(&mut domain, &triple("a p b")));
    }
}
