//! The matching core, split into one file per concern:
//!
//! - [`rule`]: the closed rule-variant algebra and its match/render logic.
//! - [`match_tree`]: the `Match` tree produced by a successful match.
//! - [`input`]: the input text plus the packrat memoization cache.
//! - [`grammar`]: named rule collections with inheritance.
//! - [`error`]: the three error kinds (parse, grammar, host).
//! - [`driver`]: the parse entry point and its options.

#[path = "engine/rule.rs"]
mod rule;
#[path = "engine/match_tree.rs"]
mod match_tree;
#[path = "engine/input.rs"]
mod input;
#[path = "engine/grammar.rs"]
mod grammar;
#[path = "engine/error.rs"]
mod error;
#[path = "engine/driver.rs"]
mod driver;

pub use driver::ParseOptions;
pub use error::{Error, GrammarError, HostError, ParseError};
pub use grammar::{Grammar, RuleDef};
pub use input::Input;
pub use match_tree::Match;
pub use rule::{
    alias, alt, and_pred, label, literal, not_pred, one_or_more, optional, regex, rep, seq,
    super_ref, zero_or_more, ExtensionTag, Rule, RuleId,
};
