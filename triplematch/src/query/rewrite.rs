//! Constraint rewriting.
//!
//! `q:matches(x, /pattern/)` where the pattern is plain text (optionally
//! anchored at one end) is turned into a cheaper string test:
//!
//! | Pattern  | Rewritten to              |
//! |----------|---------------------------|
//! | `^text`  | `j:startsWith(x, "text")` |
//! | `text$`  | `j:endsWith(x, "text")`   |
//! | `text`   | `j:contains(x, "text")`   |
//!
//! With the `i` modifier the `...Insensitive` relation is used and the
//! constant is lower-cased. Anything else is left untouched.

use crate::graph::Term;

use super::expression::{
    CONTAINS, CONTAINS_INSENSITIVE, ENDS_WITH, ENDS_WITH_INSENSITIVE, Expression, MATCHES,
    PatternLiteral, RDQL, STARTS_WITH, STARTS_WITH_INSENSITIVE,
};

const METACHARACTERS: &[char] = &[
    '\\', '.', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|', '^', '$',
];

/// Rewrite an expression tree bottom-up.
#[must_use]
pub fn rewrite(expression: Expression) -> Expression {
    match expression {
        Expression::Application { function, args } => {
            let args: Vec<Expression> = args.into_iter().map(rewrite).collect();
            if function == MATCHES {
                if let [left, Expression::Pattern(pattern)] = args.as_slice() {
                    if let Some(rewritten) = rewrite_match(left, pattern) {
                        return rewritten;
                    }
                }
            }
            Expression::Application { function, args }
        }
        other => other,
    }
}

fn rewrite_match(left: &Expression, pattern: &PatternLiteral) -> Option<Expression> {
    if pattern.language != RDQL {
        return None;
    }
    let insensitive = match pattern.modifiers.as_str() {
        "" => false,
        "i" => true,
        _ => return None,
    };

    let text = pattern.text.as_str();
    let (function, body) = match (text.strip_prefix('^'), text.strip_suffix('$')) {
        (Some(_), Some(_)) => return None,
        (Some(rest), None) => (pick(insensitive, STARTS_WITH, STARTS_WITH_INSENSITIVE), rest),
        (None, Some(rest)) => (pick(insensitive, ENDS_WITH, ENDS_WITH_INSENSITIVE), rest),
        (None, None) => (pick(insensitive, CONTAINS, CONTAINS_INSENSITIVE), text),
    };
    if body.contains(METACHARACTERS) {
        return None;
    }

    let constant = if insensitive {
        body.to_lowercase()
    } else {
        body.to_owned()
    };
    Some(Expression::apply(
        function,
        vec![left.clone(), Expression::Constant(Term::literal(&constant))],
    ))
}

const fn pick(insensitive: bool, sensitive: &'static str, folded: &'static str) -> &'static str {
    if insensitive { folded } else { sensitive }
}
