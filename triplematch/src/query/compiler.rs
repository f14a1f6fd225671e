//! Pattern compilation.
//!
//! Classifies every term of a triple pattern into an [`Element`] relative to
//! the query's [`Mapping`]. Compilation is purely structural: it depends
//! only on the mapping state and term order, never on store contents.

use crate::graph::{Term, Triple};

use super::element::{Element, QueryTriple};
use super::error::QueryError;
use super::mapping::Mapping;

/// Compiles triple patterns against a mapping, allocating slots as new
/// variables are seen.
#[derive(Debug)]
pub struct PatternCompiler<'a> {
    mapping: &'a mut Mapping,
}

impl<'a> PatternCompiler<'a> {
    /// Create a compiler that allocates into `mapping`.
    pub const fn new(mapping: &'a mut Mapping) -> Self {
        Self { mapping }
    }

    /// Compile one triple pattern.
    ///
    /// # Errors
    ///
    /// Propagates mapping errors; these indicate a compiler bug since every
    /// variable is checked with `has_bound` before a slot is allocated.
    pub fn compile(&mut self, triple: &Triple) -> Result<QueryTriple, QueryError> {
        Ok(QueryTriple::new(
            self.element(&triple.subject)?,
            self.element(&triple.predicate)?,
            self.element(&triple.object)?,
        ))
    }

    /// Compile a block of triple patterns in order.
    ///
    /// # Errors
    ///
    /// See [`compile`](Self::compile).
    pub fn compile_all(&mut self, triples: &[Triple]) -> Result<Vec<QueryTriple>, QueryError> {
        triples.iter().map(|t| self.compile(t)).collect()
    }

    fn element(&mut self, term: &Term) -> Result<Element, QueryError> {
        match term {
            Term::Any => Ok(Element::Any),
            Term::Variable(_) => {
                // Bound by an earlier triple, or earlier in this one (`?x p ?x`):
                // either way the match compares against the slot.
                if self.mapping.has_bound(term) {
                    Ok(Element::Bound(self.mapping.index_of(term)?))
                } else {
                    Ok(Element::Bind(self.mapping.new_index(term)?))
                }
            }
            _ => Ok(Element::Fixed(term.clone())),
        }
    }
}
