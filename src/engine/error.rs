//! The three error kinds: [`ParseError`] (recoverable, the caller may
//! retry with different input), [`GrammarError`] (fatal misconfiguration),
//! and [`HostError`] (a failure in a host-language facility the grammar
//! leaned on, currently just regex compilation).

use crate::engine::input::Input;

/// A failed parse: the grammar is well-formed, but no match consuming the
/// required span was found.
///
/// Carries the furthest offset reached by any rule during the attempt, which
/// is usually a much better error-reporting anchor than "it didn't match" —
/// it names the longest prefix any alternative was able to account for.
#[derive(Debug, thiserror::Error)]
#[error("failed to parse input at offset {max_offset}, just after \"{tail}\"")]
pub struct ParseError {
    input: String,
    max_offset: usize,
    consumed_prefix: String,
    tail: String,
}

impl ParseError {
    pub(crate) fn new(input: &Input) -> Self {
        let text = input.text();
        let max_offset = input.max_offset().min(text.len());
        let consumed_prefix = text.get(..max_offset).unwrap_or(text).to_string();
        let tail = tail_of(&consumed_prefix, 40);
        ParseError { input: text.to_string(), max_offset, consumed_prefix, tail }
    }

    /// The full input that was parsed.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The furthest offset any rule reached before the parse gave up.
    pub fn max_offset(&self) -> usize {
        self.max_offset
    }

    /// `input[..max_offset]`: the longest prefix some rule accounted for.
    pub fn consumed_prefix(&self) -> &str {
        &self.consumed_prefix
    }
}

/// Returns the last `at_most` characters of `s`, without splitting a
/// multi-byte character.
fn tail_of(s: &str, at_most: usize) -> String {
    let start = s.char_indices().rev().nth(at_most.saturating_sub(1)).map(|(i, _)| i).unwrap_or(0);
    s[start..].to_string()
}

/// A grammar that is malformed in a way no parse attempt can recover from:
/// the caller must fix the grammar definition, not retry with different
/// input.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    /// `parse` was called against a grammar with no rules defined at all.
    #[error("grammar '{grammar}' has no rules defined")]
    Empty { grammar: String },
    /// Neither an explicit root override nor the grammar's own root name nor
    /// any defined rule is available to serve as an entry point.
    #[error("grammar '{grammar}' has no root rule (define at least one rule, or call set_root)")]
    NoRoot { grammar: String },
    /// The effective root name (explicit override, `set_root`, or first
    /// defined rule) does not name a rule that actually exists.
    #[error("root rule '{root}' is not defined in grammar '{grammar}'")]
    UnresolvedRoot { grammar: String, root: String },
    /// An `alias(name)` rule was used but `name` does not resolve to any
    /// rule in its grammar or ancestor chain.
    #[error("unresolved alias '{name}' in grammar '{grammar}'")]
    UnresolvedAlias { grammar: String, name: String },
    /// A `super_ref()` rule was used but the enclosing rule's name does not
    /// resolve to any rule in an ancestor grammar.
    #[error("unresolved super reference '{name}' in grammar '{grammar}'")]
    UnresolvedSuper { grammar: String, name: String },
    /// A `super_ref()` rule was used outside of any `Grammar::define` call,
    /// so it has no enclosing rule name to resolve against.
    #[error("super reference used outside of a grammar definition")]
    UnboundSuper,
    /// `rep`'s `min` exceeds its `max`.
    #[error("repetition bounds are invalid: min ({min}) must be <= max ({max})")]
    InvalidRepeatBounds { min: usize, max: usize },
}

/// A failure in a host-language facility the grammar relied on.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// `regex(pattern)` was called with a pattern the `regex` crate could
    /// not compile.
    #[error("failed to compile regex pattern {pattern:?}")]
    RegexCompile {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// The top-level error returned by [`crate::Grammar::parse`]: either an
/// ordinary parse failure, or a grammar misconfiguration discovered while
/// resolving the entry point.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_of_respects_char_boundaries() {
        let s = "héllo wörld";
        let t = tail_of(s, 3);
        assert!(s.ends_with(&t));
        assert!(t.chars().count() <= 3);
    }

    #[test]
    fn parse_error_message_shape() {
        let input = Input::new("abcdef");
        input.touch_offset(3);
        let err = ParseError::new(&input);
        assert_eq!(err.max_offset(), 3);
        assert_eq!(err.consumed_prefix(), "abc");
        assert!(err.to_string().contains("offset 3"));
    }
}
