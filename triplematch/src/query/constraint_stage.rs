//! Final constraint filter.
//!
//! Forwards only the domains for which every remaining constraint holds.
//! Constraints that could be checked earlier have already been placed as
//! guards inside the pattern stages.

use std::sync::Arc;

use super::error::QueryError;
use super::pipe::PipeSender;
use super::stage::{Stage, StageContext, StageState, Upstream};
use super::valuator::ValuatorSet;

/// Filters domains through a set of compiled constraints.
#[derive(Debug)]
pub struct ConstraintStage {
    upstream: Upstream,
    valuators: ValuatorSet,
    state: Arc<StageState>,
}

impl ConstraintStage {
    /// Create a stage evaluating `valuators`.
    #[must_use]
    pub fn new(valuators: ValuatorSet) -> Self {
        Self {
            upstream: Upstream::default(),
            valuators,
            state: StageState::new("constraint"),
        }
    }

    /// Wire the stage that feeds this one.
    pub fn connect_from(&mut self, previous: Box<dyn Stage>) {
        self.upstream.connect(previous);
    }
}

impl Stage for ConstraintStage {
    fn state(&self) -> Arc<StageState> {
        Arc::clone(&self.state)
    }

    fn deliver(
        self: Box<Self>,
        sink: PipeSender,
        context: &StageContext<'_>,
    ) -> Result<(), QueryError> {
        let Self {
            upstream,
            valuators,
            state,
        } = *self;
        let mut input = upstream.deliver("constraint", context)?;
        context.spawn(Arc::clone(&state), sink, move |sink| {
            while state.is_open() && input.has_next()? {
                let domain = input.get()?;
                if valuators.evaluate_all(&domain)? {
                    sink.put(domain)?;
                }
            }
            Ok(())
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::graph::Term;
    use crate::query::domain::Domain;
    use crate::query::expression::Expression;
    use crate::query::mapping::Mapping;
    use crate::query::relation::RelationRegistry;
    use crate::query::stage::InitialStage;
    use crate::query::worker::WorkerPool;

    fn run(expression: Expression) -> Result<Vec<Domain>, QueryError> {
        let mut mapping = Mapping::new();
        mapping.new_index(&Term::var("x")).expect("x");
        let valuators =
            ValuatorSet::compile(&[expression], &mapping, &RelationRegistry::with_builtins())
                .expect("compile");

        let pool = WorkerPool::new(&EngineConfig::default()).expect("pool");
        let context = StageContext::new(&pool, 5);
        let mut stage = ConstraintStage::new(valuators);
        stage.connect_from(Box::new(InitialStage::new(mapping.size())));

        let (tx, rx) = context.pipe();
        Box::new(stage).deliver(tx, &context).expect("deliver");
        rx.collect()
    }

    #[test]
    fn test_true_constraint_forwards() {
        let results = run(Expression::eq(Expression::token("a"), Expression::token("a")))
            .expect("results");
        assert_eq!(results, vec![Domain::new(1)]);
    }

    #[test]
    fn test_false_constraint_drops() {
        let results = run(Expression::eq(Expression::token("a"), Expression::token("b")))
            .expect("results");
        assert!(results.is_empty());
    }

    #[test]
    fn test_evaluation_error_closes_pipe_with_cause() {
        let result = run(Expression::eq(Expression::token("?x"), Expression::token("a")));
        assert_eq!(result, Err(QueryError::UnsetVariable(Term::var("x"))));
    }
}
