//! A packrat Parsing Expression Grammar (PEG) engine.
//!
//! A [`Grammar`] is a named, ordered collection of [`Rule`]s, built from a
//! small closed algebra (literals, regexes, sequences, choices, repetition,
//! lookahead predicates, labels, and same-/ancestor-grammar references).
//! Matching a rule against an [`Input`] at an offset is memoized, giving the
//! whole engine a linear-time bound in the absence of left recursion (which
//! this crate does not support: a left-recursive rule recurses until the
//! call stack is exhausted rather than being detected and rejected).
//!
//! ```
//! use pegrowan::{Grammar, ParseOptions};
//!
//! let g = Grammar::new();
//! g.define("greeting", "hello");
//! let m = g.parse("hello", &ParseOptions::default()).unwrap();
//! assert_eq!(m.text(), "hello");
//! ```

#[macro_use]
mod macros;
mod engine;

pub use engine::{
    alias, alt, and_pred, label, literal, not_pred, one_or_more, optional, regex, rep, seq,
    super_ref, zero_or_more, Error, ExtensionTag, Grammar, GrammarError, HostError, Input, Match,
    ParseError, ParseOptions, Rule, RuleDef, RuleId,
};
