//! End-to-end scenarios exercising a `Grammar` through its public API only.

use pegrowan::{alias, alt, and_pred, literal, one_or_more, optional, regex, seq, super_ref, Error, Grammar, GrammarError, ParseOptions};

#[test]
fn fixed_width_terminal_matches_exactly() {
    let g = Grammar::new();
    g.define("abc", "abc");

    let m = g.parse("abc", &ParseOptions::default()).unwrap();
    assert_eq!(m.text(), "abc");
    assert_eq!(m.length(), 3);
    assert!(m.is_terminal());
    assert!(m.children().is_empty());
}

#[test]
fn regex_terminal_exposes_no_captures_for_a_groupless_pattern() {
    let g = Grammar::new();
    g.define("alpha", regex("(?i)[a-z]+").unwrap());

    let m = g.parse("abc", &ParseOptions::default()).unwrap();
    assert_eq!(m.text(), "abc");
    assert_eq!(m.length(), 3);
    assert!(m.captures().is_empty());
}

#[test]
fn sequence_of_small_numbers_requires_every_digit() {
    let build = || {
        let g = Grammar::new();
        g.define("num", vec![pegrowan::RuleDef::from(1i64), pegrowan::RuleDef::from(2i64), pegrowan::RuleDef::from(3i64)]);
        g
    };

    assert_eq!(build().parse("123", &ParseOptions::default()).unwrap().length(), 3);
    assert!(build().parse("1234", &ParseOptions::default()).is_err());
    assert!(build().parse("12", &ParseOptions::default()).is_err());
}

#[test]
fn choice_between_a_letter_and_a_digit_range() {
    let g = Grammar::new();
    let alpha = regex("(?i)[a-z]").unwrap();
    g.define("alphanum", vec![pegrowan::RuleDef::from(alpha), pegrowan::RuleDef::from(0i64..=9i64)]);

    assert_eq!(g.parse("a", &ParseOptions::default()).unwrap().length(), 1);
    assert_eq!(g.parse("7", &ParseOptions::default()).unwrap().length(), 1);

    let case_sensitive = Grammar::new();
    let alpha_only = regex("[a-z]").unwrap();
    case_sensitive.define("alphanum", vec![pegrowan::RuleDef::from(alpha_only), pegrowan::RuleDef::from(0i64..=9i64)]);
    assert!(case_sensitive.parse("A", &ParseOptions::default()).is_err());
}

/// A recursive grammar (balanced parentheses around a letter) parses in a
/// way that scales with nesting depth rather than blowing up, which the
/// memoized dispatch in `Input` is what makes possible.
#[test]
fn recursive_grammar_handles_deep_nesting() {
    let g = Grammar::new();
    let letter = regex("[a-z]").unwrap();
    let paren = alt(vec![seq(vec![literal("("), alias("paren"), literal(")")]), letter]);
    g.define("paren", paren);

    let shallow = g.parse("((a))", &ParseOptions::default()).unwrap();
    assert_eq!(shallow.length(), 5);

    let depth = 200;
    let deeply_nested = format!("{}{}{}", "(".repeat(depth), "a", ")".repeat(depth));
    let deep = g.parse(&deeply_nested, &ParseOptions::default()).unwrap();
    assert_eq!(deep.length(), deeply_nested.len());
}

/// A grammar redefines an inherited rule in terms of itself via `super_ref`,
/// the same pattern a `FloatingPoint` grammar would use to extend a
/// `Number` grammar's integer rule with an optional fractional part.
#[test]
fn grammar_inheritance_redefines_a_rule_via_super() {
    let number = Grammar::named("Number");
    number.define("number", regex("[0-9]+").unwrap());

    let floating_point = Grammar::named("FloatingPoint");
    floating_point.include(&number);
    let with_fraction = seq(vec![super_ref(), optional(seq(vec![literal("."), super_ref()]))]);
    floating_point.define("number", with_fraction);

    let with_dot = floating_point.parse("3.14", &ParseOptions::default()).unwrap();
    assert_eq!(with_dot.text(), "3.14");

    let integer_only = floating_point.parse("3", &ParseOptions::default()).unwrap();
    assert_eq!(integer_only.text(), "3");

    // The base grammar is untouched by the child's redefinition.
    assert!(matches!(number.parse("3.14", &ParseOptions::default()), Err(Error::Parse(_))));
}

#[test]
fn find_and_first_navigate_labeled_children() {
    let g = Grammar::new();
    let key = regex("[a-z]+").unwrap();
    let value = regex("[0-9]+").unwrap();
    g.define(
        "assignment",
        seq(vec![pegrowan::label("key", key), literal("="), pegrowan::label("value", value)]),
    );

    let m = g.parse("width=42", &ParseOptions::default()).unwrap();
    assert_eq!(m.first(Some("key")).unwrap().text(), "width");
    assert_eq!(m.first(Some("value")).unwrap().text(), "42");
    assert!(m.find("key", false).len() == 1);
}

#[test]
fn not_predicate_rejects_a_word_with_more_than_three_letters() {
    let g = Grammar::new();
    // At most three letters, and not immediately followed by a fourth.
    g.define(
        "short_word",
        seq(vec![pegrowan::rep(regex("[a-z]").unwrap(), 1, Some(3)).unwrap(), pegrowan::not_pred(regex("[a-z]").unwrap())]),
    );

    assert!(g.parse("cat", &ParseOptions::default()).is_ok());
    assert!(g.parse("cats", &ParseOptions { consume_all: false, ..Default::default() }).is_err());
}

#[test]
fn and_predicate_requires_lookahead_without_consuming() {
    let g = Grammar::new();
    g.define("peek_digit_then_letters", seq(vec![and_pred(regex("[0-9]").unwrap()), regex("[0-9][a-z]+").unwrap()]));

    let m = g.parse("1abc", &ParseOptions::default()).unwrap();
    assert_eq!(m.text(), "1abc");
}

#[test]
fn to_peg_round_trips_through_readable_notation() {
    let g = Grammar::new();
    let rule = seq(vec![literal("a"), alt(vec![literal("b"), literal("c")]), one_or_more(literal("d"))]);
    g.define("example", rule);

    assert_eq!(g.rule("example").unwrap().to_peg(), "\"a\" (\"b\" | \"c\") \"d\"+");
}

#[test]
fn empty_grammar_reports_a_grammar_error_distinct_from_parse_error() {
    let g = Grammar::new();
    match g.parse("anything", &ParseOptions::default()) {
        Err(Error::Grammar(GrammarError::Empty { .. })) => {}
        other => panic!("expected Error::Grammar(Empty), got {other:?}"),
    }
}
