//! Relations registered on one engine are usable in its constraints.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::e2e_tests::helpers::*;
use crate::query::expression::Expression;
use crate::query::{Engine, QueryError, Relation, Value};

/// `ex:longerThan(x, n)`: the string form of `x` has more than `n` chars.
#[derive(Debug)]
struct LongerThan;

impl Relation for LongerThan {
    fn name(&self) -> &str {
        "ex:longerThan"
    }

    fn arity(&self) -> usize {
        2
    }

    fn holds(&self, args: &[Value]) -> Result<bool, QueryError> {
        let limit: usize = args[1]
            .string_form()
            .parse()
            .map_err(|_| QueryError::NotBoolean(self.name().to_owned()))?;
        Ok(args[0].string_form().chars().count() > limit)
    }
}

fn longer_than(variable: &str, limit: &str) -> Expression {
    Expression::apply(
        "ex:longerThan",
        vec![Expression::token(variable), Expression::token(limit)],
    )
}

#[test]
fn test_registered_relation_filters() {
    let mut engine = Engine::new(EngineConfig::default()).expect("Engine should start");
    engine
        .relations_mut()
        .register(Arc::new(LongerThan))
        .expect("Relation should register");

    let query = query("?x says ?y").add_constraint(longer_than("?y", "3"));
    let result = run(
        &engine,
        &query,
        graph_with("a says 'hi'; b says 'hello'; c says 'hey'"),
        "?x",
    )
    .expect("Query should run");
    assert_eq!(result, rows(&["[b]"]));
}

#[test]
fn test_relation_unknown_to_other_engines() {
    let plain = engine();
    let query = query("?x says ?y").add_constraint(longer_than("?y", "3"));
    let result = plain.execute_bindings(&query, graph_with(""), &[]);
    assert_eq!(
        result.err(),
        Some(QueryError::UnknownFunction("ex:longerThan".to_owned()))
    );
}

#[test]
fn test_builtin_names_cannot_be_replaced() {
    #[derive(Debug)]
    struct FakeEq;

    impl Relation for FakeEq {
        fn name(&self) -> &str {
            crate::query::expression::EQ
        }

        fn arity(&self) -> usize {
            2
        }

        fn holds(&self, _args: &[Value]) -> Result<bool, QueryError> {
            Ok(true)
        }
    }

    let mut engine = engine();
    let result = engine.relations_mut().register(Arc::new(FakeEq));
    assert_eq!(
        result,
        Err(QueryError::DuplicateFactory(crate::query::expression::EQ.to_owned()))
    );
}
