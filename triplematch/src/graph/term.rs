//! Terms and triples.
//!
//! A `Term` is the atomic value of the graph vocabulary: a URI, a literal,
//! a blank node, a query variable, or the wildcard `Any`. Terms are cheap to
//! clone (string storage is shared).
//!
//! # Token syntax
//!
//! Terms and triples can be written compactly, which keeps tests and
//! hand-built queries readable:
//!
//! - `??` is the wildcard, `?x` a variable, `_b` a blank node
//! - `'text'`, `'text'@en` and `'text'^^xsd:integer` are literals
//! - `42` and `-7` are `xsd:integer` literals
//! - anything else is a URI; `eh:/` is prepended when it has no `:`
//!
//! ```
//! use triplematch::graph::{Term, Triple};
//! let t = Triple::parse("?x knows 'bob'").unwrap();
//! assert!(t.subject.is_variable());
//! assert_eq!(t.predicate, Term::uri("eh:/knows"));
//! ```

use std::fmt;
use std::sync::Arc;

/// The XML Schema namespace.
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

/// Prefix given to bare tokens that do not look like URIs.
pub const DEFAULT_PREFIX: &str = "eh:/";

const NUMERIC_TYPES: &[&str] = &[
    "integer",
    "decimal",
    "double",
    "float",
    "int",
    "long",
    "short",
    "byte",
    "nonNegativeInteger",
    "nonPositiveInteger",
    "positiveInteger",
    "negativeInteger",
    "unsignedInt",
    "unsignedLong",
    "unsignedShort",
    "unsignedByte",
];

/// A literal value: lexical form plus optional datatype or language tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    lexical: Arc<str>,
    datatype: Option<Arc<str>>,
    language: Option<Arc<str>>,
}

impl Literal {
    /// The lexical form.
    #[must_use]
    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    /// The datatype URI, if any.
    #[must_use]
    pub fn datatype(&self) -> Option<&str> {
        self.datatype.as_deref()
    }

    /// The language tag, if any.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    fn is_numeric(&self) -> bool {
        self.datatype
            .as_deref()
            .and_then(|dt| dt.strip_prefix(XSD))
            .is_some_and(|local| NUMERIC_TYPES.contains(&local))
    }

    fn is_simple_string(&self) -> bool {
        self.language.is_none()
            && self
                .datatype
                .as_deref()
                .is_none_or(|dt| dt.strip_prefix(XSD) == Some("string"))
    }

    fn same_value_as(&self, other: &Self) -> bool {
        if self.is_numeric() && other.is_numeric() {
            if let (Some(a), Some(b)) = (parse_number(&self.lexical), parse_number(&other.lexical))
            {
                return a.equals(b);
            }
        }
        if self.is_simple_string() && other.is_simple_string() {
            return self.lexical == other.lexical;
        }
        match (&self.language, &other.language) {
            (Some(a), Some(b)) => {
                self.lexical == other.lexical
                    && a.eq_ignore_ascii_case(b)
                    && self.datatype == other.datatype
            }
            _ => self == other,
        }
    }
}

/// A parsed numeric literal.
#[derive(Debug, Clone, Copy)]
enum Number {
    Integer(i128),
    Float(f64),
}

impl Number {
    /// Exact numeric equality. A float equals an integer only when it is
    /// integral and in `i128` range.
    #[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
    fn equals(self, other: Self) -> bool {
        const I128_BOUND: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Integer(i), Self::Float(f)) | (Self::Float(f), Self::Integer(i)) => {
                f.fract() == 0.0 && (-I128_BOUND..I128_BOUND).contains(&f) && f as i128 == i
            }
            (Self::Float(a), Self::Float(b)) => a == b,
        }
    }
}

fn parse_number(lexical: &str) -> Option<Number> {
    let trimmed = lexical.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if let Ok(n) = unsigned.parse::<i128>() {
        return Some(Number::Integer(n));
    }
    unsigned.parse::<f64>().ok().map(Number::Float)
}

/// A graph term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// A URI reference.
    Uri(Arc<str>),
    /// A literal.
    Literal(Literal),
    /// A blank node, identified by its label.
    Blank(Arc<str>),
    /// A query variable, identified by its name (without the `?`).
    Variable(Arc<str>),
    /// The wildcard: matches anything in a `find`, never stored.
    Any,
}

impl Term {
    /// Create a URI term.
    #[must_use]
    pub fn uri(uri: &str) -> Self {
        Self::Uri(Arc::from(uri))
    }

    /// Create a plain literal.
    #[must_use]
    pub fn literal(lexical: &str) -> Self {
        Self::Literal(Literal {
            lexical: Arc::from(lexical),
            datatype: None,
            language: None,
        })
    }

    /// Create a typed literal.
    #[must_use]
    pub fn typed_literal(lexical: &str, datatype: &str) -> Self {
        Self::Literal(Literal {
            lexical: Arc::from(lexical),
            datatype: Some(Arc::from(datatype)),
            language: None,
        })
    }

    /// Create a language-tagged literal.
    #[must_use]
    pub fn lang_literal(lexical: &str, language: &str) -> Self {
        Self::Literal(Literal {
            lexical: Arc::from(lexical),
            datatype: None,
            language: Some(Arc::from(language)),
        })
    }

    /// Create an `xsd:integer` literal.
    #[must_use]
    pub fn integer(n: i64) -> Self {
        Self::typed_literal(&n.to_string(), &format!("{XSD}integer"))
    }

    /// Create a blank node.
    #[must_use]
    pub fn blank(label: &str) -> Self {
        Self::Blank(Arc::from(label))
    }

    /// Create a variable.
    #[must_use]
    pub fn var(name: &str) -> Self {
        Self::Variable(Arc::from(name))
    }

    /// Build a term from the token syntax described in the module docs.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        if token == "??" {
            return Self::Any;
        }
        if let Some(name) = token.strip_prefix('?') {
            return Self::var(name);
        }
        if let Some(label) = token.strip_prefix('_') {
            return Self::blank(label);
        }
        if let Some(rest) = token.strip_prefix('\'') {
            return literal_from_token(rest);
        }
        let digits = token.strip_prefix('-').unwrap_or(token);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return Self::typed_literal(token, &format!("{XSD}integer"));
        }
        Self::uri(&expand_uri(token))
    }

    /// True for variables.
    #[must_use]
    pub const fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }

    /// True for URIs, literals and blank nodes.
    #[must_use]
    pub const fn is_concrete(&self) -> bool {
        !matches!(self, Self::Variable(_) | Self::Any)
    }

    /// True for literals.
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// The literal, if this is one.
    #[must_use]
    pub const fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(l) => Some(l),
            _ => None,
        }
    }

    /// The string form used by string relations: lexical form for
    /// literals, URI text, blank label, or variable name.
    #[must_use]
    pub fn string_form(&self) -> &str {
        match self {
            Self::Uri(s) | Self::Blank(s) | Self::Variable(s) => s,
            Self::Literal(l) => &l.lexical,
            Self::Any => "ANY",
        }
    }

    /// Value equality.
    ///
    /// Unlike `==`, numeric literals compare by value (`'1'^^xsd:int`
    /// equals `'01'^^xsd:integer`), plain literals equal their `xsd:string`
    /// counterparts and language tags compare case-insensitively.
    #[must_use]
    pub fn same_value_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a.same_value_as(b),
            _ => self == other,
        }
    }
}

fn literal_from_token(rest: &str) -> Term {
    let Some(close) = rest.rfind('\'') else {
        return Term::literal(rest);
    };
    let lexical = &rest[..close];
    let suffix = &rest[close + 1..];
    if let Some(language) = suffix.strip_prefix('@') {
        Term::lang_literal(lexical, language)
    } else if let Some(datatype) = suffix.strip_prefix("^^") {
        Term::typed_literal(lexical, &expand_uri(datatype))
    } else {
        Term::literal(lexical)
    }
}

fn expand_uri(token: &str) -> String {
    if let Some(local) = token.strip_prefix("xsd:") {
        format!("{XSD}{local}")
    } else if token.contains(':') {
        token.to_owned()
    } else {
        format!("{DEFAULT_PREFIX}{token}")
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uri(uri) => match uri.strip_prefix(DEFAULT_PREFIX) {
                Some(local) => write!(f, "{local}"),
                None => write!(f, "{uri}"),
            },
            Self::Literal(l) => {
                write!(f, "'{}'", l.lexical)?;
                if let Some(language) = &l.language {
                    write!(f, "@{language}")?;
                } else if let Some(datatype) = &l.datatype {
                    match datatype.strip_prefix(XSD) {
                        Some(local) => write!(f, "^^xsd:{local}")?,
                        None => write!(f, "^^{datatype}")?,
                    }
                }
                Ok(())
            }
            Self::Blank(label) => write!(f, "_{label}"),
            Self::Variable(name) => write!(f, "?{name}"),
            Self::Any => write!(f, "??"),
        }
    }
}

/// A (subject, predicate, object) triple.
///
/// Stored triples hold concrete terms; query patterns may hold variables
/// and the wildcard in any position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    /// The subject.
    pub subject: Term,
    /// The predicate.
    pub predicate: Term,
    /// The object.
    pub object: Term,
}

impl Triple {
    /// Create a new triple.
    #[must_use]
    pub const fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Parse a triple written as three tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not contain exactly three tokens.
    pub fn parse(text: &str) -> Result<Self, TripleParseError> {
        let tokens = tokenize(text);
        match tokens.as_slice() {
            [s, p, o] => Ok(Self::new(
                Term::from_token(s),
                Term::from_token(p),
                Term::from_token(o),
            )),
            _ => Err(TripleParseError {
                text: text.trim().to_owned(),
                found: tokens.len(),
            }),
        }
    }

    /// The three terms in subject, predicate, object order.
    #[must_use]
    pub const fn terms(&self) -> [&Term; 3] {
        [&self.subject, &self.predicate, &self.object]
    }

    /// The distinct variables of this triple, in order of first occurrence.
    #[must_use]
    pub fn variables(&self) -> Vec<&Term> {
        let mut vars: Vec<&Term> = Vec::with_capacity(3);
        for term in self.terms() {
            if term.is_variable() && !vars.contains(&term) {
                vars.push(term);
            }
        }
        vars
    }

    /// True if every position is concrete.
    #[must_use]
    pub fn is_concrete(&self) -> bool {
        self.terms().iter().all(|t| t.is_concrete())
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}

/// Parse a `;`-separated list of triples. Empty items are skipped.
///
/// # Errors
///
/// Returns the first item that is not exactly three tokens.
pub fn triples(text: &str) -> Result<Vec<Triple>, TripleParseError> {
    split_items(text)
        .into_iter()
        .filter(|item| !item.trim().is_empty())
        .map(Triple::parse)
        .collect()
}

/// Parse a whitespace-separated list of terms.
#[must_use]
pub fn terms(text: &str) -> Vec<Term> {
    tokenize(text).iter().map(|t| Term::from_token(t)).collect()
}

/// Split on `;` outside quoted literals.
fn split_items(text: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            ';' if !quoted => {
                items.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&text[start..]);
    items
}

/// Split on whitespace outside quoted literals.
fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut quoted = false;
    let mut start: Option<usize> = None;
    for (i, c) in text.char_indices() {
        if c == '\'' {
            quoted = !quoted;
        }
        if c.is_whitespace() && !quoted {
            if let Some(s) = start.take() {
                tokens.push(&text[s..i]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(&text[s..]);
    }
    tokens
}

/// Error returned when a triple cannot be parsed from tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripleParseError {
    /// The offending text.
    pub text: String,
    /// How many tokens were found.
    pub found: usize,
}

impl fmt::Display for TripleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expected 3 terms in triple '{}', found {}",
            self.text, self.found
        )
    }
}

impl std::error::Error for TripleParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_kinds() {
        assert_eq!(Term::from_token("??"), Term::Any);
        assert_eq!(Term::from_token("?x"), Term::var("x"));
        assert_eq!(Term::from_token("_b1"), Term::blank("b1"));
        assert_eq!(Term::from_token("'hello'"), Term::literal("hello"));
        assert_eq!(Term::from_token("'chat'@fr"), Term::lang_literal("chat", "fr"));
        assert_eq!(Term::from_token("230"), Term::integer(230));
        assert_eq!(Term::from_token("knows"), Term::uri("eh:/knows"));
        assert_eq!(
            Term::from_token("http://example.org/a"),
            Term::uri("http://example.org/a")
        );
    }

    #[test]
    fn test_typed_literal_token() {
        let term = Term::from_token("'1.5'^^xsd:double");
        let literal = term.as_literal().expect("literal");
        assert_eq!(literal.lexical(), "1.5");
        assert_eq!(literal.datatype(), Some("http://www.w3.org/2001/XMLSchema#double"));
    }

    #[test]
    fn test_same_value_numeric() {
        let a = Term::from_token("'01'^^xsd:integer");
        let b = Term::from_token("'1'^^xsd:int");
        let c = Term::from_token("'1.0'^^xsd:double");
        assert_ne!(a, b);
        assert!(a.same_value_as(&b));
        assert!(b.same_value_as(&c));
        assert!(!a.same_value_as(&Term::integer(2)));
    }

    #[test]
    fn test_same_value_distinct_small_doubles() {
        let a = Term::from_token("'1.0E-20'^^xsd:double");
        let b = Term::from_token("'2.0E-20'^^xsd:double");
        assert!(!a.same_value_as(&b));
        assert!(a.same_value_as(&Term::from_token("'1e-20'^^xsd:double")));
    }

    #[test]
    fn test_same_value_float_against_integer() {
        let one = Term::integer(1);
        assert!(one.same_value_as(&Term::from_token("'1.0'^^xsd:double")));
        assert!(!one.same_value_as(&Term::from_token("'1.0000000000000002'^^xsd:double")));
        assert!(!Term::integer(0).same_value_as(&Term::from_token("'1.0E-300'^^xsd:double")));
        assert!(!Term::integer(i64::MAX).same_value_as(&Term::from_token("'1.0E40'^^xsd:double")));
    }

    #[test]
    fn test_same_value_strings_and_languages() {
        let plain = Term::literal("cat");
        let typed = Term::from_token("'cat'^^xsd:string");
        assert!(plain.same_value_as(&typed));
        assert!(Term::lang_literal("cat", "EN").same_value_as(&Term::lang_literal("cat", "en")));
        assert!(!plain.same_value_as(&Term::lang_literal("cat", "en")));
        assert!(!plain.same_value_as(&Term::uri("cat")));
    }

    #[test]
    fn test_parse_triple_with_quoted_spaces() {
        let t = Triple::parse("a says 'hello world'").expect("parse");
        assert_eq!(t.object, Term::literal("hello world"));
    }

    #[test]
    fn test_parse_triple_wrong_arity() {
        let err = Triple::parse("a b").expect_err("two tokens");
        assert_eq!(err.found, 2);
        assert_eq!(err.to_string(), "expected 3 terms in triple 'a b', found 2");
    }

    #[test]
    fn test_triples_list() {
        let list = triples("a p b; c q 'x;y'; ").expect("parse");
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].object, Term::literal("x;y"));
    }

    #[test]
    fn test_variables_deduplicated() {
        let t = Triple::parse("?x p ?x").expect("parse");
        assert_eq!(t.variables(), vec![&Term::var("x")]);
    }

    #[test]
    fn test_display_round_trip() {
        for token in ["??", "?x", "_b", "'v'@en", "'3'^^xsd:integer", "knows"] {
            let term = Term::from_token(token);
            assert_eq!(Term::from_token(&term.to_string()), term);
        }
    }
}
