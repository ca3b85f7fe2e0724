//! The parse entry point: resolves an effective root rule, runs it against
//! an [`Input`], and checks the consume-all policy.

use crate::engine::error::{Error, GrammarError, ParseError};
use crate::engine::grammar::Grammar;
use crate::engine::input::Input;
use crate::engine::match_tree::Match;
use crate::engine::rule::Rule;

/// Per-call parse parameters. `consume_all` defaults to `true`: a parse
/// that does not account for the entire input (from `offset` onward) is
/// treated as a failure unless the caller opts out.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub offset: usize,
    pub consume_all: bool,
    pub root: Option<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions { offset: 0, consume_all: true, root: None }
    }
}

impl Grammar {
    /// Parses `input` starting at `options.offset` against this grammar's
    /// effective root rule (an explicit `options.root` override, else
    /// `set_root`, else the first rule defined).
    ///
    /// Returns `Err(Error::Grammar(..))` if the grammar itself is
    /// misconfigured (no rules, or the effective root name is not defined)
    /// — a fault the caller must fix by changing the grammar, not by
    /// retrying with different input. Returns `Err(Error::Parse(..))` for an
    /// ordinary failed match, or a match that did not consume the whole
    /// input under `consume_all`.
    pub fn parse(&self, input: &str, options: &ParseOptions) -> Result<Match, Error> {
        let root = self.resolve_root(options.root.as_deref())?;
        let parse_input = Input::new(input);
        let result = parse_input.match_rule(&root, options.offset);
        match result {
            Some(m) if !options.consume_all || m.length() == parse_input.len().saturating_sub(options.offset) => Ok(m),
            _ => Err(ParseError::new(&parse_input).into()),
        }
    }

    fn resolve_root(&self, override_name: Option<&str>) -> Result<Rule, GrammarError> {
        if self.is_empty() {
            return Err(GrammarError::Empty { grammar: self.name() });
        }
        let root_name =
            self.effective_root_name(override_name).ok_or_else(|| GrammarError::NoRoot { grammar: self.name() })?;
        self.rule(&root_name).ok_or_else(|| GrammarError::UnresolvedRoot { grammar: self.name(), root: root_name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rule::literal;

    #[test]
    fn defaults_are_offset_zero_consume_all_no_override() {
        let opts = ParseOptions::default();
        assert_eq!(opts.offset, 0);
        assert!(opts.consume_all);
        assert!(opts.root.is_none());
    }

    #[test]
    fn empty_grammar_is_a_grammar_error_not_a_parse_error() {
        let g = Grammar::new();
        match g.parse("x", &ParseOptions::default()) {
            Err(Error::Grammar(GrammarError::Empty { .. })) => {}
            other => panic!("expected Error::Grammar(Empty), got {other:?}"),
        }
    }

    #[test]
    fn unresolved_root_override_is_a_grammar_error() {
        let g = Grammar::new();
        g.define("a", "x");
        let opts = ParseOptions { root: Some("nope".to_string()), ..Default::default() };
        match g.parse("x", &opts) {
            Err(Error::Grammar(GrammarError::UnresolvedRoot { .. })) => {}
            other => panic!("expected Error::Grammar(UnresolvedRoot), got {other:?}"),
        }
    }

    #[test]
    fn consume_all_rejects_partial_match() {
        let g = Grammar::new();
        g.define("a", literal("a"));
        assert!(matches!(g.parse("ab", &ParseOptions::default()), Err(Error::Parse(_))));
        let opts = ParseOptions { consume_all: false, ..Default::default() };
        assert_eq!(g.parse("ab", &opts).unwrap().text(), "a");
    }

    #[test]
    fn offset_starts_the_match_partway_through_input() {
        let g = Grammar::new();
        g.define("b", literal("b"));
        let opts = ParseOptions { offset: 1, ..Default::default() };
        assert_eq!(g.parse("ab", &opts).unwrap().text(), "b");
    }
}
