//! String-match constraints, including the rewritten forms.

use crate::e2e_tests::helpers::*;
use crate::query::expression::{CONTAINS, Expression, PatternLiteral, STARTS_WITH_INSENSITIVE};

const DATA: &str = "alpha ppp beta; beta ppp 'hello'; gamma ppp 'goodbye'";

fn matches(variable: &str, pattern: &str, modifiers: &str) -> Expression {
    Expression::matches(
        Expression::token(variable),
        Expression::Pattern(PatternLiteral::rdql(pattern, modifiers)),
    )
}

#[test]
fn test_substring_match_after_join() {
    let engine = engine();
    let query = query("?x ppp ?y; ?z ppp ?x").add_constraint(matches("?y", "ell", ""));
    let result = run(&engine, &query, graph_with(DATA), "?x").expect("Query should run");
    assert_eq!(result, rows(&["[beta]"]));
}

#[test]
fn test_plain_pattern_rewrites_to_contains() {
    let query = query("?x ppp ?y").add_constraint(matches("?y", "ell", ""));
    let constraint = query.constraints().iter().next().expect("one constraint");
    assert_eq!(constraint.function(), Some(CONTAINS));
}

#[test]
fn test_anchored_insensitive_match() {
    let engine = engine();
    let query = query("?x ppp ?y").add_constraint(matches("?y", "^GOOD", "i"));
    let constraint = query.constraints().iter().next().expect("one constraint");
    assert_eq!(constraint.function(), Some(STARTS_WITH_INSENSITIVE));

    let result = run(&engine, &query, graph_with(DATA), "?x").expect("Query should run");
    assert_eq!(result, rows(&["[gamma]"]));
}

#[test]
fn test_suffix_match() {
    let engine = engine();
    let query = query("?x ppp ?y").add_constraint(matches("?y", "bye$", ""));
    let result = run(&engine, &query, graph_with(DATA), "?x").expect("Query should run");
    assert_eq!(result, rows(&["[gamma]"]));
}

#[test]
fn test_unrewritten_pattern_is_substring() {
    let engine = engine();
    let query = query("?x ppp ?y").add_constraint(matches("?y", "^hello$", ""));
    let result = run(&engine, &query, graph_with(DATA), "?x").expect("Query should run");
    assert!(result.is_empty());

    let query = crate::e2e_tests::helpers::query("?x ppp ?y").add_constraint(Expression::matches(
        Expression::token("?y"),
        Expression::token("'oodb'"),
    ));
    let result = run(&engine, &query, graph_with(DATA), "?x").expect("Query should run");
    assert_eq!(result, rows(&["[gamma]"]));
}
