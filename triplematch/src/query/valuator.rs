//! Compiled constraint expressions.
//!
//! A [`Valuator`] is an [`Expression`] with variables resolved to slots and
//! function names resolved to relations. Valuators are immutable and are
//! shared by reference between stage workers.

use std::fmt;
use std::sync::Arc;

use crate::graph::Term;

use super::domain::Domain;
use super::error::QueryError;
use super::expression::Expression;
use super::mapping::Mapping;
use super::relation::{Relation, RelationRegistry, Value};

/// A compiled expression.
#[derive(Debug, Clone)]
pub enum Valuator {
    /// A constant value.
    Constant(Value),
    /// Read a slot of the domain.
    Slot { index: usize, variable: Term },
    /// Apply a relation to compiled arguments.
    Apply {
        relation: Arc<dyn Relation>,
        args: Vec<Self>,
    },
}

impl Valuator {
    /// Compile an expression.
    ///
    /// # Errors
    ///
    /// - `UnboundVariable` if a variable has no slot in `mapping`
    /// - `UnknownFunction` if no relation has the applied name
    /// - `WrongArity` if the argument count does not match the relation
    pub fn compile(
        expression: &Expression,
        mapping: &Mapping,
        relations: &RelationRegistry,
    ) -> Result<Self, QueryError> {
        match expression {
            Expression::Constant(term) => Ok(Self::Constant(Value::Term(term.clone()))),
            Expression::Variable(variable) => Ok(Self::Slot {
                index: mapping.index_of(variable)?,
                variable: variable.clone(),
            }),
            // A `q:matches` that was not rewritten to a regex relation tests
            // for a plain case-sensitive substring; modifiers are ignored.
            Expression::Pattern(pattern) => {
                Ok(Self::Constant(Value::Term(Term::literal(&pattern.text))))
            }
            Expression::True => Ok(Self::Constant(Value::Boolean(true))),
            Expression::Application { function, args } => {
                let relation = relations
                    .get(function)
                    .ok_or_else(|| QueryError::UnknownFunction(function.clone()))?;
                if relation.arity() != args.len() {
                    return Err(QueryError::WrongArity {
                        function: function.clone(),
                        expected: relation.arity(),
                        found: args.len(),
                    });
                }
                let args = args
                    .iter()
                    .map(|arg| Self::compile(arg, mapping, relations))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Apply {
                    relation: Arc::clone(relation),
                    args,
                })
            }
        }
    }

    /// Evaluate against a domain.
    ///
    /// # Errors
    ///
    /// Returns `UnsetVariable` if a referenced slot has no value, or any
    /// error raised by a relation.
    pub fn evaluate(&self, domain: &Domain) -> Result<Value, QueryError> {
        match self {
            Self::Constant(value) => Ok(value.clone()),
            Self::Slot { index, variable } => domain
                .get(*index)
                .map(|term| Value::Term(term.clone()))
                .ok_or_else(|| QueryError::UnsetVariable(variable.clone())),
            Self::Apply { relation, args } => {
                let values = args
                    .iter()
                    .map(|arg| arg.evaluate(domain))
                    .collect::<Result<Vec<_>, _>>()?;
                relation.holds(&values).map(Value::Boolean)
            }
        }
    }

    /// Evaluate as a boolean condition.
    ///
    /// # Errors
    ///
    /// Returns `NotBoolean` if the expression yields a term.
    pub fn evaluate_bool(&self, domain: &Domain) -> Result<bool, QueryError> {
        match self.evaluate(domain)? {
            Value::Boolean(b) => Ok(b),
            Value::Term(_) => Err(QueryError::NotBoolean(self.to_string())),
        }
    }
}

impl fmt::Display for Valuator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(Value::Term(term)) => write!(f, "{term}"),
            Self::Constant(Value::Boolean(b)) => write!(f, "{b}"),
            Self::Slot { index, variable } => write!(f, "{variable}@{index}"),
            Self::Apply { relation, args } => {
                write!(f, "{}(", relation.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A conjunction of compiled constraints.
#[derive(Debug, Clone, Default)]
pub struct ValuatorSet {
    valuators: Vec<Valuator>,
}

impl ValuatorSet {
    /// Create an empty set, which accepts every domain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile every expression into a set.
    ///
    /// # Errors
    ///
    /// See [`Valuator::compile`].
    pub fn compile<'a>(
        expressions: impl IntoIterator<Item = &'a Expression>,
        mapping: &Mapping,
        relations: &RelationRegistry,
    ) -> Result<Self, QueryError> {
        let valuators = expressions
            .into_iter()
            .map(|e| Valuator::compile(e, mapping, relations))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { valuators })
    }

    /// True when every constraint holds. Stops at the first false one.
    ///
    /// # Errors
    ///
    /// Propagates the first evaluation error.
    pub fn evaluate_all(&self, domain: &Domain) -> Result<bool, QueryError> {
        for valuator in &self.valuators {
            if !valuator.evaluate_bool(domain)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Number of constraints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.valuators.len()
    }

    /// True if there are no constraints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.valuators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::expression::PatternLiteral;

    fn setup() -> (Mapping, RelationRegistry) {
        let mut mapping = Mapping::new();
        mapping.new_index(&Term::var("x")).expect("x");
        mapping.new_index(&Term::var("y")).expect("y");
        (mapping, RelationRegistry::with_builtins())
    }

    fn domain(x: &str, y: &str) -> Domain {
        Domain::from_slots(vec![Some(Term::from_token(x)), Some(Term::from_token(y))])
    }

    #[test]
    fn test_compile_and_evaluate() {
        let (mapping, relations) = setup();
        let valuator = Valuator::compile(
            &Expression::ne(Expression::token("?x"), Expression::token("?y")),
            &mapping,
            &relations,
        )
        .expect("compile");

        assert!(valuator.evaluate_bool(&domain("a", "b")).expect("eval"));
        assert!(!valuator.evaluate_bool(&domain("a", "a")).expect("eval"));
    }

    #[test]
    fn test_unmapped_variable() {
        let (mapping, relations) = setup();
        let result = Valuator::compile(
            &Expression::eq(Expression::token("?z"), Expression::token("a")),
            &mapping,
            &relations,
        );
        assert_eq!(
            result.err(),
            Some(QueryError::UnboundVariable(Term::var("z")))
        );
    }

    #[test]
    fn test_unknown_function_and_arity() {
        let (mapping, relations) = setup();
        let unknown = Valuator::compile(
            &Expression::apply("q:nope", vec![]),
            &mapping,
            &relations,
        );
        assert_eq!(
            unknown.err(),
            Some(QueryError::UnknownFunction("q:nope".to_owned()))
        );

        let arity = Valuator::compile(
            &Expression::apply("q:not", vec![Expression::True, Expression::True]),
            &mapping,
            &relations,
        );
        assert!(matches!(arity, Err(QueryError::WrongArity { expected: 1, found: 2, .. })));
    }

    #[test]
    fn test_unset_slot() {
        let (mapping, relations) = setup();
        let valuator = Valuator::compile(
            &Expression::eq(Expression::token("?y"), Expression::token("a")),
            &mapping,
            &relations,
        )
        .expect("compile");
        let partial = Domain::from_slots(vec![Some(Term::from_token("a")), None]);
        assert_eq!(
            valuator.evaluate(&partial),
            Err(QueryError::UnsetVariable(Term::var("y")))
        );
    }

    #[test]
    fn test_unrewritten_pattern_is_substring() {
        let (mapping, relations) = setup();
        let valuator = Valuator::compile(
            &Expression::matches(
                Expression::token("?x"),
                Expression::Pattern(PatternLiteral::rdql("ell", "")),
            ),
            &mapping,
            &relations,
        )
        .expect("compile");
        assert!(valuator.evaluate_bool(&domain("'hello'", "b")).expect("eval"));
    }

    #[test]
    fn test_unrewritten_pattern_ignores_modifiers_and_metacharacters() {
        let (mapping, relations) = setup();
        let compile = |text: &str, modifiers: &str| {
            Valuator::compile(
                &Expression::matches(
                    Expression::token("?x"),
                    Expression::Pattern(PatternLiteral::rdql(text, modifiers)),
                ),
                &mapping,
                &relations,
            )
            .expect("compile")
        };
        let row = domain("'hello'", "b");
        assert!(!compile("ELL", "i").evaluate_bool(&row).expect("eval"));
        assert!(!compile("^h", "").evaluate_bool(&row).expect("eval"));
        assert!(compile("ell", "i").evaluate_bool(&row).expect("eval"));
    }

    #[test]
    fn test_term_is_not_boolean() {
        let (mapping, relations) = setup();
        let valuator =
            Valuator::compile(&Expression::token("?x"), &mapping, &relations).expect("compile");
        assert!(matches!(
            valuator.evaluate_bool(&domain("a", "b")),
            Err(QueryError::NotBoolean(_))
        ));
    }

    #[test]
    fn test_set_short_circuits() {
        let (mapping, relations) = setup();
        let set = ValuatorSet::compile(
            &[
                Expression::eq(Expression::token("?x"), Expression::token("b")),
                Expression::eq(Expression::token("?y"), Expression::token("b")),
            ],
            &mapping,
            &relations,
        )
        .expect("compile");
        // ?y is unset but the first conjunct already fails.
        let partial = Domain::from_slots(vec![Some(Term::from_token("a")), None]);
        assert!(!set.evaluate_all(&partial).expect("eval"));
        assert!(ValuatorSet::new().evaluate_all(&partial).expect("empty"));
    }
}
