//! The input text plus its packrat memoization cache.
//!
//! Every sub-rule match goes through [`Input::match_rule`], keyed on the
//! rule's [`RuleId`] and the offset being tried. Both successes and
//! failures are cached, which is what gives the engine its linear-time
//! guarantee for non-left-recursive grammars: a given (rule, offset) pair
//! is evaluated at most once per parse.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::engine::match_tree::Match;
use crate::engine::rule::{Rule, RuleId};

/// One parse's worth of input text and memoization state. Constructed
/// internally by [`crate::Grammar::parse`]; not meant to be kept around
/// past a single parse, since every [`Match`] it produces owns its own text.
pub struct Input<'a> {
    text: &'a str,
    cache: RefCell<HashMap<RuleId, HashMap<usize, Option<Match>>>>,
    cache_hits: Cell<u64>,
    max_offset: Cell<usize>,
}

impl<'a> Input<'a> {
    pub fn new(text: &'a str) -> Self {
        Input { text, cache: RefCell::new(HashMap::new()), cache_hits: Cell::new(0), max_offset: Cell::new(0) }
    }

    /// The full input text.
    pub fn text(&self) -> &str {
        self.text
    }

    /// The input's length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// `self.len() == 0`.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The furthest offset any rule reached while matching against this
    /// input. Used by [`crate::ParseError`] to report where the parse gave
    /// up.
    pub fn max_offset(&self) -> usize {
        self.max_offset.get()
    }

    /// How many times `match_rule` was answered from the cache rather than
    /// by evaluating the rule. A per-parse observability counter, not reset
    /// between calls on the same `Input`.
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.get()
    }

    #[cfg(test)]
    pub(crate) fn touch_offset(&self, offset: usize) {
        if offset > self.max_offset.get() {
            self.max_offset.set(offset);
        }
    }

    /// Matches `rule` at `offset`, through the memoization cache: on a
    /// repeat (rule, offset) pair this returns the cached result without
    /// re-evaluating the rule.
    pub fn match_rule(&self, rule: &Rule, offset: usize) -> Option<Match> {
        if offset > self.max_offset.get() {
            self.max_offset.set(offset);
        }
        let id = rule.id();
        if let Some(hit) = self.cache.borrow().get(&id).and_then(|by_offset| by_offset.get(&offset)) {
            self.cache_hits.set(self.cache_hits.get() + 1);
            log::trace!("cache hit: rule #{} offset {offset}", id.raw());
            return hit.clone();
        }
        log::trace!("cache miss: rule #{} offset {offset}", id.raw());
        let result = rule.eval(self, offset);
        self.cache.borrow_mut().entry(id).or_default().insert(offset, result.clone());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rule::{alt, literal, regex, seq};

    #[test]
    fn len_and_is_empty_reflect_the_wrapped_text() {
        let input = Input::new("abcdef");
        assert_eq!(input.len(), 6);
        assert!(!input.is_empty());

        let empty = Input::new("");
        assert_eq!(empty.len(), 0);
        assert!(empty.is_empty());
    }

    #[test]
    fn max_offset_tracks_the_furthest_attempt() {
        let input = Input::new("abcdef");
        let digit = literal("z");
        input.match_rule(&digit, 4);
        assert_eq!(input.max_offset(), 4);
        input.match_rule(&digit, 1);
        assert_eq!(input.max_offset(), 4);
    }

    #[test]
    fn repeat_lookups_of_the_same_rule_and_offset_hit_the_cache() {
        let input = Input::new("hello!");
        let word = regex("[a-z]+").unwrap();
        // A choice where both alternatives ask for `word` at offset 0: the
        // first alternative (word followed by "?") fails, falling through to
        // plain `word`, which must be answered from the cache.
        let choice = alt(vec![seq(vec![word.clone(), literal("?")]), word]);
        let m = input.match_rule(&choice, 0).unwrap();
        assert_eq!(m.text(), "hello");
        assert!(input.cache_hits() >= 1);
    }

    #[test]
    fn same_rule_and_offset_is_evaluated_only_once() {
        let input = Input::new("abc");
        let r = literal("abc");
        let first = input.match_rule(&r, 0);
        let hits_before = input.cache_hits();
        let second = input.match_rule(&r, 0);
        assert_eq!(first.as_ref().map(Match::text), second.as_ref().map(Match::text));
        assert_eq!(input.cache_hits(), hits_before + 1);
    }
}
