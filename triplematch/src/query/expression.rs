//! Constraint expressions.
//!
//! Expressions are the uncompiled form of a query's constraints: trees of
//! constants, variables, pattern literals and named function applications.
//! They are compiled against a mapping and a relation registry into
//! [`Valuator`](super::valuator::Valuator)s before execution.

use std::fmt;

use crate::graph::Term;

/// Value equality.
pub const EQ: &str = "q:eq";
/// Negated value equality.
pub const NE: &str = "q:ne";
/// Substring match.
pub const MATCHES: &str = "q:matches";
/// Conjunction.
pub const AND: &str = "q:and";
/// Disjunction.
pub const OR: &str = "q:or";
/// Negation.
pub const NOT: &str = "q:not";
/// Prefix test.
pub const STARTS_WITH: &str = "j:startsWith";
/// Suffix test.
pub const ENDS_WITH: &str = "j:endsWith";
/// Substring test.
pub const CONTAINS: &str = "j:contains";
/// Case-insensitive prefix test.
pub const STARTS_WITH_INSENSITIVE: &str = "j:startsWithInsensitive";
/// Case-insensitive suffix test.
pub const ENDS_WITH_INSENSITIVE: &str = "j:endsWithInsensitive";
/// Case-insensitive substring test.
pub const CONTAINS_INSENSITIVE: &str = "j:containsInsensitive";

/// The pattern language understood by the rewriter.
pub const RDQL: &str = "rdql";

/// An already-parsed string pattern such as `/^abc/i`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternLiteral {
    /// The pattern text, without delimiters.
    pub text: String,
    /// Modifier letters (`"i"` for case-insensitive).
    pub modifiers: String,
    /// The pattern language tag.
    pub language: String,
}

impl PatternLiteral {
    /// Create a pattern literal.
    #[must_use]
    pub fn new(text: &str, modifiers: &str, language: &str) -> Self {
        Self {
            text: text.to_owned(),
            modifiers: modifiers.to_owned(),
            language: language.to_owned(),
        }
    }

    /// An RDQL pattern with the given modifiers.
    #[must_use]
    pub fn rdql(text: &str, modifiers: &str) -> Self {
        Self::new(text, modifiers, RDQL)
    }
}

impl fmt::Display for PatternLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.text, self.modifiers)
    }
}

/// A constraint expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// A constant term.
    Constant(Term),
    /// A query variable.
    Variable(Term),
    /// A named function applied to arguments.
    Application {
        function: String,
        args: Vec<Self>,
    },
    /// A string pattern literal.
    Pattern(PatternLiteral),
    /// Always true.
    True,
}

impl Expression {
    /// Wrap a term: variables become `Variable`, anything else `Constant`.
    #[must_use]
    pub fn term(term: Term) -> Self {
        if term.is_variable() {
            Self::Variable(term)
        } else {
            Self::Constant(term)
        }
    }

    /// Wrap a term written in token syntax.
    #[must_use]
    pub fn token(token: &str) -> Self {
        Self::term(Term::from_token(token))
    }

    /// Apply a named function.
    #[must_use]
    pub fn apply(function: &str, args: Vec<Self>) -> Self {
        Self::Application {
            function: function.to_owned(),
            args,
        }
    }

    /// `q:eq(left, right)`.
    #[must_use]
    pub fn eq(left: Self, right: Self) -> Self {
        Self::apply(EQ, vec![left, right])
    }

    /// `q:ne(left, right)`.
    #[must_use]
    pub fn ne(left: Self, right: Self) -> Self {
        Self::apply(NE, vec![left, right])
    }

    /// `q:matches(left, right)`.
    #[must_use]
    pub fn matches(left: Self, right: Self) -> Self {
        Self::apply(MATCHES, vec![left, right])
    }

    /// `q:and(left, right)`.
    #[must_use]
    pub fn and(left: Self, right: Self) -> Self {
        Self::apply(AND, vec![left, right])
    }

    /// `q:or(left, right)`.
    #[must_use]
    pub fn or(left: Self, right: Self) -> Self {
        Self::apply(OR, vec![left, right])
    }

    /// `q:not(operand)`.
    #[must_use]
    pub fn not(operand: Self) -> Self {
        Self::apply(NOT, vec![operand])
    }

    /// The function name, for applications.
    #[must_use]
    pub fn function(&self) -> Option<&str> {
        match self {
            Self::Application { function, .. } => Some(function),
            _ => None,
        }
    }

    /// The arguments, for applications.
    #[must_use]
    pub fn args(&self) -> &[Self] {
        match self {
            Self::Application { args, .. } => args,
            _ => &[],
        }
    }

    /// True for the literal `True` expression.
    #[must_use]
    pub const fn is_true(&self) -> bool {
        matches!(self, Self::True)
    }

    /// The distinct variables referenced, in order of first occurrence.
    #[must_use]
    pub fn variables(&self) -> Vec<&Term> {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars
    }

    fn collect_variables<'a>(&'a self, into: &mut Vec<&'a Term>) {
        match self {
            Self::Variable(v) => {
                if !into.contains(&v) {
                    into.push(v);
                }
            }
            Self::Application { args, .. } => {
                for arg in args {
                    arg.collect_variables(into);
                }
            }
            Self::Constant(_) | Self::Pattern(_) | Self::True => {}
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(term) | Self::Variable(term) => write!(f, "{term}"),
            Self::Application { function, args } => {
                write!(f, "{function}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Self::Pattern(pattern) => write!(f, "{pattern}"),
            Self::True => write!(f, "true"),
        }
    }
}

/// A conjunction of constraint expressions.
///
/// Top-level `q:and` applications are split into separate conjuncts so
/// each can be placed as a guard on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpressionSet {
    expressions: Vec<Expression>,
}

impl ExpressionSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an expression, splitting top-level conjunctions.
    pub fn add(&mut self, expression: Expression) {
        match expression {
            Expression::Application { function, args } if function == AND && args.len() == 2 => {
                for arg in args {
                    self.add(arg);
                }
            }
            other => self.expressions.push(other),
        }
    }

    /// Number of conjuncts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    /// True if there are no conjuncts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    /// Iterate over the conjuncts.
    pub fn iter(&self) -> std::slice::Iter<'_, Expression> {
        self.expressions.iter()
    }
}

impl<'a> IntoIterator for &'a ExpressionSet {
    type Item = &'a Expression;
    type IntoIter = std::slice::Iter<'a, Expression>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_wrapping() {
        assert_eq!(Expression::token("?x"), Expression::Variable(Term::var("x")));
        assert_eq!(
            Expression::token("'hello'"),
            Expression::Constant(Term::literal("hello"))
        );
    }

    #[test]
    fn test_variables_deduplicated() {
        let e = Expression::and(
            Expression::eq(Expression::token("?x"), Expression::token("?y")),
            Expression::ne(Expression::token("?y"), Expression::token("a")),
        );
        assert_eq!(e.variables(), vec![&Term::var("x"), &Term::var("y")]);
    }

    #[test]
    fn test_set_splits_conjunctions() {
        let mut set = ExpressionSet::new();
        set.add(Expression::and(
            Expression::and(Expression::True, Expression::token("?a")),
            Expression::not(Expression::token("?b")),
        ));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_set_keeps_true_conjuncts() {
        let mut set = ExpressionSet::new();
        assert!(set.is_empty());
        set.add(Expression::True);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_display() {
        let e = Expression::matches(
            Expression::token("?x"),
            Expression::Pattern(PatternLiteral::rdql("^abc", "i")),
        );
        assert_eq!(e.to_string(), "q:matches(?x, /^abc/i)");
    }
}
