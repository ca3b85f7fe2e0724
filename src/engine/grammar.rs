//! Named, ordered collections of rules with single-chain inheritance.
//!
//! A [`Grammar`] owns a map from rule name to [`Rule`], the insertion order
//! of those names, an ancestor list (other grammars it `include`s, most
//! recently included first), and an optional explicit root-rule override.
//! `define`/`include`/`set_root` all take `&self`: a `Grammar` is a shared,
//! interior-mutable handle (cheap to clone), matching how a grammar is
//! typically built up incrementally and then handed to several parsers.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::rc::{Rc, Weak};

use regex::Regex;

use crate::engine::rule::{literal, seq, Rule};

pub(crate) struct GrammarData {
    name: String,
    order: Vec<String>,
    rules: HashMap<String, Rule>,
    ancestors: Vec<Grammar>,
    root: Option<String>,
}

/// A named collection of rules. Cheap to clone; clones share the same
/// underlying rule map.
#[derive(Clone)]
pub struct Grammar(Rc<RefCell<GrammarData>>);

/// A non-owning reference to a [`Grammar`], held by every [`Rule`] installed
/// into it so `Alias`/`Super` rules can resolve names against the grammar
/// that owns them.
#[derive(Clone)]
pub(crate) struct GrammarWeak(Weak<RefCell<GrammarData>>);

impl GrammarWeak {
    pub(crate) fn upgrade(&self) -> Option<Grammar> {
        self.0.upgrade().map(Grammar)
    }
}

/// Anything [`Grammar::define`] accepts as a rule definition: an
/// already-built rule object, a literal string, a compiled regex, a small
/// integer (rendered as its decimal `FixedWidth`), an ordered sequence of
/// definitions (installed as a `Sequence`), or a bounded range of
/// characters/integers (installed as a `Choice` over its enumeration).
pub enum RuleDef {
    Rule(Rule),
    Literal(String),
    Regex(Regex),
    Number(i64),
    Seq(Vec<RuleDef>),
    CharRange(RangeInclusive<char>),
    IntRange(RangeInclusive<i64>),
}

impl From<Rule> for RuleDef {
    fn from(r: Rule) -> Self {
        RuleDef::Rule(r)
    }
}

impl From<&str> for RuleDef {
    fn from(s: &str) -> Self {
        RuleDef::Literal(s.to_string())
    }
}

impl From<String> for RuleDef {
    fn from(s: String) -> Self {
        RuleDef::Literal(s)
    }
}

impl From<Regex> for RuleDef {
    fn from(re: Regex) -> Self {
        RuleDef::Regex(re)
    }
}

impl From<i64> for RuleDef {
    fn from(n: i64) -> Self {
        RuleDef::Number(n)
    }
}

impl From<Vec<RuleDef>> for RuleDef {
    fn from(v: Vec<RuleDef>) -> Self {
        RuleDef::Seq(v)
    }
}

impl From<Vec<Rule>> for RuleDef {
    fn from(v: Vec<Rule>) -> Self {
        RuleDef::Seq(v.into_iter().map(RuleDef::Rule).collect())
    }
}

impl From<RangeInclusive<char>> for RuleDef {
    fn from(r: RangeInclusive<char>) -> Self {
        RuleDef::CharRange(r)
    }
}

impl From<RangeInclusive<i64>> for RuleDef {
    fn from(r: RangeInclusive<i64>) -> Self {
        RuleDef::IntRange(r)
    }
}

impl Grammar {
    /// An empty, unnamed grammar.
    pub fn new() -> Self {
        Self::named(String::new())
    }

    /// An empty grammar with a name, used in error messages and logging.
    pub fn named(name: impl Into<String>) -> Self {
        Grammar(Rc::new(RefCell::new(GrammarData {
            name: name.into(),
            order: Vec::new(),
            rules: HashMap::new(),
            ancestors: Vec::new(),
            root: None,
        })))
    }

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    /// Installs `def` under `name`: sets its name, installs a back-reference
    /// to this grammar on it and, transitively, on every node in its tree
    /// (so nested `Super` rules pick up `name` as their implicit target).
    /// Redefining an existing name replaces it in place without disturbing
    /// its position in `rule_names()`.
    pub fn define(&self, name: impl Into<String>, def: impl Into<RuleDef>) -> Rule {
        let name = name.into();
        let rule = Self::materialize(def.into());
        rule.set_name(name.clone());
        rule.rebind(&self.downgrade(), &name);

        let mut data = self.0.borrow_mut();
        if data.rules.contains_key(&name) {
            log::debug!("grammar '{}': redefining rule '{name}'", data.name);
        } else {
            data.order.push(name.clone());
        }
        data.rules.insert(name, rule.clone());
        rule
    }

    fn materialize(def: RuleDef) -> Rule {
        match def {
            RuleDef::Rule(r) => r,
            RuleDef::Literal(s) => literal(s),
            RuleDef::Regex(re) => crate::engine::rule::regex_compiled(re),
            RuleDef::Number(n) => literal(n.to_string()),
            RuleDef::Seq(defs) => seq(defs.into_iter().map(Grammar::materialize)),
            RuleDef::CharRange(range) => crate::engine::rule::alt(range.map(|c| literal(c.to_string()))),
            RuleDef::IntRange(range) => crate::engine::rule::alt(range.map(|n| literal(n.to_string()))),
        }
    }

    /// Looks up `name`: first in this grammar's own rules, then in each
    /// ancestor (most recently included first), recursively through their
    /// own ancestor chains.
    pub fn rule(&self, name: &str) -> Option<Rule> {
        if let Some(r) = self.0.borrow().rules.get(name) {
            return Some(r.clone());
        }
        let ancestors = self.0.borrow().ancestors.clone();
        ancestors.iter().find_map(|anc| anc.rule(name))
    }

    /// Looks up `name` in this grammar's ancestor chain only, skipping its
    /// own rules — what a `Super` rule resolves against.
    pub fn super_rule(&self, name: &str) -> Option<Rule> {
        let ancestors = self.0.borrow().ancestors.clone();
        ancestors.iter().find_map(|anc| anc.rule(name))
    }

    /// Prepends `other` to this grammar's ancestor chain, making it take
    /// precedence over any grammar already included (most recently included
    /// wins ties in `rule`/`super_rule` lookups).
    pub fn include(&self, other: &Grammar) {
        self.0.borrow_mut().ancestors.insert(0, other.clone());
    }

    /// The rule names defined directly on this grammar, in definition
    /// order.
    pub fn rule_names(&self) -> Vec<String> {
        self.0.borrow().order.clone()
    }

    /// Overrides the effective root rule name used by `parse` (absent an
    /// explicit per-call override).
    pub fn set_root(&self, name: impl Into<String>) {
        self.0.borrow_mut().root = Some(name.into());
    }

    /// The explicitly set root name, if any (does not fall back to the
    /// first defined rule — see [`Grammar::resolve_root`] for that).
    pub fn root_name(&self) -> Option<String> {
        self.0.borrow().root.clone()
    }

    pub(crate) fn downgrade(&self) -> GrammarWeak {
        GrammarWeak(Rc::downgrade(&self.0))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.borrow().rules.is_empty()
    }

    pub(crate) fn effective_root_name(&self, override_name: Option<&str>) -> Option<String> {
        override_name
            .map(str::to_string)
            .or_else(|| self.root_name())
            .or_else(|| self.0.borrow().order.first().cloned())
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Grammar").field("name", &data.name).field("rules", &data.order).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_tracks_insertion_order_and_dedups_redefinitions() {
        let g = Grammar::new();
        g.define("a", "x");
        g.define("b", "y");
        g.define("a", "z");
        assert_eq!(g.rule_names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(g.rule("a").unwrap().to_peg(), "\"z\"");
    }

    #[test]
    fn rule_falls_back_to_ancestors_most_recent_first() {
        let base = Grammar::new();
        base.define("x", "base");

        let override_first = Grammar::new();
        override_first.define("x", "override");

        let child = Grammar::new();
        child.include(&base);
        child.include(&override_first);

        assert_eq!(child.rule("x").unwrap().to_peg(), "\"override\"");
    }

    #[test]
    fn super_rule_skips_local_definition() {
        let base = Grammar::new();
        base.define("x", "base");

        let child = Grammar::new();
        child.include(&base);
        child.define("x", "child");

        assert_eq!(child.rule("x").unwrap().to_peg(), "\"child\"");
        assert_eq!(child.super_rule("x").unwrap().to_peg(), "\"base\"");
    }

    #[test]
    fn ruledef_number_and_ranges_materialize() {
        let g = Grammar::new();
        g.define("digit", 0i64..=9i64);
        assert_eq!(g.rule("digit").unwrap().to_peg(), "\"0\" | \"1\" | \"2\" | \"3\" | \"4\" | \"5\" | \"6\" | \"7\" | \"8\" | \"9\"");

        let g2 = Grammar::new();
        g2.define("seven", 7i64);
        assert_eq!(g2.rule("seven").unwrap().to_peg(), "\"7\"");
    }

    #[test]
    fn ruledef_regex_materializes_from_a_precompiled_pattern() {
        let g = Grammar::new();
        g.define("word", regex::Regex::new("[a-z]+").unwrap());
        assert_eq!(g.rule("word").unwrap().to_peg(), "/[a-z]+/");
    }
}
