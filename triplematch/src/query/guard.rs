//! Early constraint placement.
//!
//! A constraint can be checked as soon as every variable it mentions is
//! bound. The [`GuardArranger`] finds, for each constraint, the earliest
//! (block, position) in the compiled pipeline after which that holds, so the
//! pattern stage can discard failing domains before probing further.
//!
//! # Placement rules
//!
//! - Constraints that are literally `True` are dropped
//! - Constraints with no variables stay in the final constraint stage
//! - Constraints mentioning a variable that no pattern binds stay in the
//!   final constraint stage

use std::collections::HashSet;

use super::element::QueryTriple;
use super::error::QueryError;
use super::expression::Expression;
use super::mapping::Mapping;

/// Constraints grouped by where they will be evaluated.
#[derive(Debug, Default)]
pub struct Arrangement {
    /// `guards[block][position]` runs right after that triple matches.
    pub guards: Vec<Vec<Vec<Expression>>>,
    /// Constraints left for the final constraint stage.
    pub remaining: Vec<Expression>,
}

impl Arrangement {
    /// Number of constraints placed as guards.
    #[must_use]
    pub fn guard_count(&self) -> usize {
        self.guards.iter().flatten().map(Vec::len).sum()
    }
}

/// Places constraints at the earliest position where they are evaluable.
#[derive(Debug)]
pub struct GuardArranger {
    /// Slots bound once `[block][position]` has matched, cumulative across
    /// blocks.
    bound_after: Vec<Vec<HashSet<usize>>>,
}

impl GuardArranger {
    /// Build an arranger from compiled, sorted blocks.
    #[must_use]
    pub fn new(blocks: &[Vec<QueryTriple>]) -> Self {
        let mut bound: HashSet<usize> = HashSet::new();
        let bound_after = blocks
            .iter()
            .map(|block| {
                block
                    .iter()
                    .map(|triple| {
                        bound.extend(triple.elements().iter().filter_map(|e| e.binds()));
                        bound.clone()
                    })
                    .collect()
            })
            .collect();
        Self { bound_after }
    }

    /// The earliest (block, position) after which every slot is bound.
    ///
    /// Returns `None` for an empty slot set or when some slot is never
    /// bound.
    #[must_use]
    pub fn place(&self, slots: &HashSet<usize>) -> Option<(usize, usize)> {
        if slots.is_empty() {
            return None;
        }
        for (b, block) in self.bound_after.iter().enumerate() {
            for (p, bound) in block.iter().enumerate() {
                if slots.is_subset(bound) {
                    return Some((b, p));
                }
            }
        }
        None
    }

    /// Distribute constraints between guards and the final stage.
    ///
    /// # Errors
    ///
    /// Returns `UnboundVariable` if a constraint mentions an unmapped
    /// variable.
    pub fn arrange(
        &self,
        constraints: impl IntoIterator<Item = Expression>,
        mapping: &Mapping,
    ) -> Result<Arrangement, QueryError> {
        let mut arrangement = Arrangement {
            guards: self
                .bound_after
                .iter()
                .map(|block| vec![Vec::new(); block.len()])
                .collect(),
            remaining: Vec::new(),
        };

        for constraint in constraints {
            if constraint.is_true() {
                continue;
            }
            let slots = constraint
                .variables()
                .into_iter()
                .map(|v| mapping.index_of(v))
                .collect::<Result<HashSet<_>, _>>()?;
            match self.place(&slots) {
                Some((block, position)) => arrangement.guards[block][position].push(constraint),
                None => arrangement.remaining.push(constraint),
            }
        }
        Ok(arrangement)
    }
}
