//! Named relations used by constraint expressions.
//!
//! A [`RelationRegistry`] maps function names to [`Relation`]
//! implementations. Each engine owns its own registry, so the relation set
//! can be extended or tested without global state.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::graph::Term;

use super::error::QueryError;
use super::expression::{
    AND, CONTAINS, CONTAINS_INSENSITIVE, ENDS_WITH, ENDS_WITH_INSENSITIVE, EQ, MATCHES, NE, NOT,
    OR, STARTS_WITH, STARTS_WITH_INSENSITIVE,
};

/// The result of evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A term.
    Term(Term),
    /// A boolean, produced by relation applications.
    Boolean(bool),
}

impl Value {
    /// The string form used by string relations.
    #[must_use]
    pub fn string_form(&self) -> Cow<'_, str> {
        match self {
            Self::Term(term) => Cow::Borrowed(term.string_form()),
            Self::Boolean(b) => Cow::Owned(b.to_string()),
        }
    }

    /// Value equality between two evaluated operands.
    #[must_use]
    pub fn same_value_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Term(a), Self::Term(b)) => a.same_value_as(b),
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            _ => false,
        }
    }

    fn as_bool(&self, function: &str) -> Result<bool, QueryError> {
        match self {
            Self::Boolean(b) => Ok(*b),
            Self::Term(_) => Err(QueryError::NotBoolean(function.to_owned())),
        }
    }
}

/// A named predicate over evaluated arguments.
pub trait Relation: Send + Sync + Debug {
    /// The registered name.
    fn name(&self) -> &str;

    /// The exact number of arguments.
    fn arity(&self) -> usize;

    /// Decide the relation for the given arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if an argument has the wrong kind.
    fn holds(&self, args: &[Value]) -> Result<bool, QueryError>;
}

/// `q:eq` / `q:ne`.
#[derive(Debug)]
struct ValueEquality {
    name: &'static str,
    negated: bool,
}

impl Relation for ValueEquality {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> usize {
        2
    }

    fn holds(&self, args: &[Value]) -> Result<bool, QueryError> {
        Ok(args[0].same_value_as(&args[1]) != self.negated)
    }
}

#[derive(Debug, Clone, Copy)]
enum StringTest {
    StartsWith,
    EndsWith,
    Contains,
}

/// `q:matches` and the `j:` string tests.
#[derive(Debug)]
struct StringRelation {
    name: &'static str,
    test: StringTest,
    insensitive: bool,
}

impl Relation for StringRelation {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> usize {
        2
    }

    fn holds(&self, args: &[Value]) -> Result<bool, QueryError> {
        let mut left = args[0].string_form();
        let mut right = args[1].string_form();
        if self.insensitive {
            left = Cow::Owned(left.to_lowercase());
            right = Cow::Owned(right.to_lowercase());
        }
        Ok(match self.test {
            StringTest::StartsWith => left.starts_with(right.as_ref()),
            StringTest::EndsWith => left.ends_with(right.as_ref()),
            StringTest::Contains => left.contains(right.as_ref()),
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Connective {
    And,
    Or,
    Not,
}

/// `q:and`, `q:or`, `q:not`.
#[derive(Debug)]
struct Logical {
    name: &'static str,
    connective: Connective,
}

impl Relation for Logical {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> usize {
        match self.connective {
            Connective::Not => 1,
            Connective::And | Connective::Or => 2,
        }
    }

    fn holds(&self, args: &[Value]) -> Result<bool, QueryError> {
        let first = args[0].as_bool(self.name)?;
        Ok(match self.connective {
            Connective::Not => !first,
            Connective::And => first && args[1].as_bool(self.name)?,
            Connective::Or => first || args[1].as_bool(self.name)?,
        })
    }
}

/// Registry of relations by name.
#[derive(Debug, Default)]
pub struct RelationRegistry {
    relations: HashMap<String, Arc<dyn Relation>>,
}

impl RelationRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in relation.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut relations: HashMap<String, Arc<dyn Relation>> = HashMap::new();
        let mut insert = |relation: Arc<dyn Relation>| {
            relations.insert(relation.name().to_owned(), relation);
        };

        insert(Arc::new(ValueEquality {
            name: EQ,
            negated: false,
        }));
        insert(Arc::new(ValueEquality {
            name: NE,
            negated: true,
        }));
        for (name, test, insensitive) in [
            (MATCHES, StringTest::Contains, false),
            (STARTS_WITH, StringTest::StartsWith, false),
            (ENDS_WITH, StringTest::EndsWith, false),
            (CONTAINS, StringTest::Contains, false),
            (STARTS_WITH_INSENSITIVE, StringTest::StartsWith, true),
            (ENDS_WITH_INSENSITIVE, StringTest::EndsWith, true),
            (CONTAINS_INSENSITIVE, StringTest::Contains, true),
        ] {
            insert(Arc::new(StringRelation {
                name,
                test,
                insensitive,
            }));
        }
        for (name, connective) in [
            (AND, Connective::And),
            (OR, Connective::Or),
            (NOT, Connective::Not),
        ] {
            insert(Arc::new(Logical { name, connective }));
        }

        Self { relations }
    }

    /// Register a relation under its own name.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateFactory` if the name is already taken.
    pub fn register(&mut self, relation: Arc<dyn Relation>) -> Result<(), QueryError> {
        let name = relation.name().to_owned();
        if self.relations.contains_key(&name) {
            return Err(QueryError::DuplicateFactory(name));
        }
        self.relations.insert(name, relation);
        Ok(())
    }

    /// Look up a relation by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Relation>> {
        self.relations.get(name)
    }

    /// Check if a relation name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    /// Number of registered relations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// True if no relations are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(token: &str) -> Value {
        Value::Term(Term::from_token(token))
    }

    fn holds(registry: &RelationRegistry, name: &str, args: &[Value]) -> bool {
        registry
            .get(name)
            .expect("relation")
            .holds(args)
            .expect("holds")
    }

    #[test]
    fn test_builtins_present() {
        let registry = RelationRegistry::with_builtins();
        assert_eq!(registry.len(), 12);
        assert!(registry.contains(EQ));
        assert!(registry.contains(CONTAINS_INSENSITIVE));
    }

    #[test]
    fn test_eq_and_ne_are_negations() {
        let registry = RelationRegistry::with_builtins();
        let pairs = [
            (term("a"), term("a")),
            (term("a"), term("b")),
            (term("'1'^^xsd:int"), term("1")),
            (term("'x'"), term("x")),
        ];
        for (left, right) in pairs {
            let args = [left, right];
            assert_ne!(holds(&registry, EQ, &args), holds(&registry, NE, &args));
        }
        assert!(holds(&registry, EQ, &[term("'1'^^xsd:int"), term("1")]));
    }

    #[test]
    fn test_matches_is_substring() {
        let registry = RelationRegistry::with_builtins();
        assert!(holds(&registry, MATCHES, &[term("'hello'"), term("'ell'")]));
        assert!(!holds(&registry, MATCHES, &[term("'goodbye'"), term("'ell'")]));
    }

    #[test]
    fn test_string_tests() {
        let registry = RelationRegistry::with_builtins();
        let value = term("'Hello World'");
        assert!(holds(&registry, STARTS_WITH, &[value.clone(), term("'Hello'")]));
        assert!(!holds(&registry, STARTS_WITH, &[value.clone(), term("'hello'")]));
        assert!(holds(&registry, STARTS_WITH_INSENSITIVE, &[value.clone(), term("'hello'")]));
        assert!(holds(&registry, ENDS_WITH, &[value.clone(), term("'World'")]));
        assert!(holds(&registry, ENDS_WITH_INSENSITIVE, &[value.clone(), term("'world'")]));
        assert!(holds(&registry, CONTAINS_INSENSITIVE, &[value, term("'O W'")]));
    }

    #[test]
    fn test_logical_requires_booleans() {
        let registry = RelationRegistry::with_builtins();
        let and = registry.get(AND).expect("and");
        assert_eq!(
            and.holds(&[Value::Boolean(true), term("a")]),
            Err(QueryError::NotBoolean(AND.to_owned()))
        );
        assert!(holds(&registry, OR, &[Value::Boolean(false), Value::Boolean(true)]));
        assert!(holds(&registry, NOT, &[Value::Boolean(false)]));
    }

    #[test]
    fn test_duplicate_registration() {
        #[derive(Debug)]
        struct AlwaysTrue;
        impl Relation for AlwaysTrue {
            fn name(&self) -> &str {
                EQ
            }
            fn arity(&self) -> usize {
                2
            }
            fn holds(&self, _args: &[Value]) -> Result<bool, QueryError> {
                Ok(true)
            }
        }

        let mut registry = RelationRegistry::with_builtins();
        assert_eq!(
            registry.register(Arc::new(AlwaysTrue)),
            Err(QueryError::DuplicateFactory(EQ.to_owned()))
        );

        let mut empty = RelationRegistry::new();
        assert!(empty.register(Arc::new(AlwaysTrue)).is_ok());
        assert!(empty.contains(EQ));
    }
}
