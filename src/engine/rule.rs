//! The rule algebra: a closed set of ten variants, each either a terminal
//! that consumes text directly (`FixedWidth`, `Expression`) or a combinator
//! built from other rules (`Sequence`, `Choice`, `Repeat`, `AndPredicate`,
//! `NotPredicate`, `Label`) or a proxy that looks another rule up by name
//! (`Alias`, `Super`).
//!
//! A [`Rule`] is a cheap-to-clone handle (`Rc`-backed) with a stable
//! monotonic [`RuleId`] assigned at construction, used as the packrat cache
//! key. Matching never recurses directly from one rule into another: every
//! sub-match goes through [`crate::Input::match_rule`], which is the only
//! place memoization happens. This crate does not support left-recursive
//! grammars; a left-recursive rule will recurse until the call stack is
//! exhausted rather than being detected and rejected.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use regex::Regex;

use crate::engine::error::{GrammarError, HostError};
use crate::engine::grammar::{Grammar, GrammarWeak};
use crate::engine::input::Input;
use crate::engine::match_tree::Match;

/// A stable identity assigned to a rule at construction time, used as the
/// packrat cache key. Two clones of the same `Rule` share an id; two rules
/// built from identical arguments do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(u64);

impl RuleId {
    fn next() -> RuleId {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        RuleId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value, exposed for logging and debugging.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// An opaque handle a host embedding can attach to a rule and later read
/// back off its matches. This crate never inspects the handle itself; it is
/// an id into whatever callback table the embedder maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtensionTag(pub u64);

/// A name reference that resolves to a concrete rule on first use and
/// caches the result. Shared shape for both `Alias` (name supplied by the
/// caller) and `Super` (name supplied implicitly by the enclosing grammar
/// definition).
struct NameRef {
    name: RefCell<Option<String>>,
    resolved: RefCell<Option<Rule>>,
}

impl NameRef {
    fn fixed(name: String) -> Self {
        NameRef { name: RefCell::new(Some(name)), resolved: RefCell::new(None) }
    }

    fn unbound() -> Self {
        NameRef { name: RefCell::new(None), resolved: RefCell::new(None) }
    }
}

enum RuleKind {
    FixedWidth(String),
    Expression(Regex),
    Sequence(Vec<Rule>),
    Choice(Vec<Rule>),
    Repeat { min: usize, max: Option<usize>, rule: Rule },
    And(Rule),
    Not(Rule),
    Label(String, Rule),
    Alias(NameRef),
    Super(NameRef),
}

struct RuleData {
    id: RuleId,
    kind: RuleKind,
    name: RefCell<Option<String>>,
    extension: RefCell<Option<ExtensionTag>>,
    grammar: RefCell<Option<GrammarWeak>>,
}

/// A node in the rule algebra. Cheap to clone (an `Rc` handle); construction
/// via the free functions in this module (`literal`, `regex`, `seq`, ...)
/// rather than any public constructor on the type itself.
#[derive(Clone)]
pub struct Rule(Rc<RuleData>);

impl Rule {
    fn new(kind: RuleKind) -> Rule {
        Rule(Rc::new(RuleData {
            id: RuleId::next(),
            kind,
            name: RefCell::new(None),
            extension: RefCell::new(None),
            grammar: RefCell::new(None),
        }))
    }

    /// This rule's packrat cache identity.
    pub fn id(&self) -> RuleId {
        self.0.id
    }

    /// The name this rule was installed under in a grammar, if any.
    pub fn name(&self) -> Option<String> {
        self.0.name.borrow().clone()
    }

    pub(crate) fn set_name(&self, name: impl Into<String>) {
        *self.0.name.borrow_mut() = Some(name.into());
    }

    /// The extension tag attached to this rule, if any.
    pub fn extension(&self) -> Option<ExtensionTag> {
        *self.0.extension.borrow()
    }

    /// Attaches an extension tag, returning `self` for chaining.
    pub fn with_extension(self, tag: ExtensionTag) -> Rule {
        *self.0.extension.borrow_mut() = Some(tag);
        self
    }

    fn grammar(&self) -> Option<Grammar> {
        self.0.grammar.borrow().as_ref().and_then(GrammarWeak::upgrade)
    }

    /// Installs `grammar` as this rule's owning grammar and, recursively,
    /// fills in the implicit target name of any `Super` rule in its tree
    /// with `top_name` (the name this rule was just installed under).
    pub(crate) fn rebind(&self, grammar: &GrammarWeak, top_name: &str) {
        *self.0.grammar.borrow_mut() = Some(grammar.clone());
        match &self.0.kind {
            RuleKind::FixedWidth(_) | RuleKind::Expression(_) => {}
            RuleKind::Sequence(rules) | RuleKind::Choice(rules) => {
                for r in rules {
                    r.rebind(grammar, top_name);
                }
            }
            RuleKind::Repeat { rule, .. } => rule.rebind(grammar, top_name),
            RuleKind::And(r) | RuleKind::Not(r) => r.rebind(grammar, top_name),
            RuleKind::Label(_, r) => r.rebind(grammar, top_name),
            RuleKind::Alias(_) => {}
            RuleKind::Super(s) => {
                *s.name.borrow_mut() = Some(top_name.to_string());
                *s.resolved.borrow_mut() = None;
            }
        }
    }

    /// Dispatches to this rule's matching logic. Only ever called by
    /// [`Input::match_rule`], which is where memoization happens; rules
    /// never call this on each other directly, always through the input.
    pub(crate) fn eval(&self, input: &Input, offset: usize) -> Option<Match> {
        match &self.0.kind {
            RuleKind::FixedWidth(s) => self.eval_fixed(s, input, offset),
            RuleKind::Expression(re) => self.eval_expression(re, input, offset),
            RuleKind::Sequence(rules) => self.eval_sequence(rules, input, offset),
            RuleKind::Choice(rules) => self.eval_choice(rules, input, offset),
            RuleKind::Repeat { min, max, rule } => self.eval_repeat(*min, *max, rule, input, offset),
            RuleKind::And(r) => self.eval_and(r, input, offset),
            RuleKind::Not(r) => self.eval_not(r, input, offset),
            RuleKind::Label(name, r) => self.eval_label(name, r, input, offset),
            RuleKind::Alias(a) => self.eval_name_ref(a, input, offset, false),
            RuleKind::Super(a) => self.eval_name_ref(a, input, offset, true),
        }
    }

    fn apply_self(&self, m: Match) -> Match {
        let m = match self.extension() {
            Some(ext) => m.with_extension(ext),
            None => m,
        };
        match self.name() {
            Some(name) => m.with_name(name),
            None => m,
        }
    }

    fn eval_fixed(&self, s: &str, input: &Input, offset: usize) -> Option<Match> {
        let ok = input.text().as_bytes().get(offset..).map(|b| b.starts_with(s.as_bytes())).unwrap_or(false);
        if ok {
            Some(self.apply_self(Match::terminal(s.to_string())))
        } else {
            None
        }
    }

    fn eval_expression(&self, re: &Regex, input: &Input, offset: usize) -> Option<Match> {
        let slice = input.text().get(offset..)?;
        let caps = re.captures(slice)?;
        let whole = caps.get(0).expect("a successful regex match always has group 0");
        if whole.start() != 0 {
            // The leftmost match in `slice` starts later than `offset`: there is
            // no match anchored to this exact position.
            return None;
        }
        let captures: Vec<String> =
            (1..caps.len()).filter_map(|i| caps.get(i)).map(|g| g.as_str().to_string()).collect();
        Some(self.apply_self(Match::terminal_with_captures(whole.as_str().to_string(), captures)))
    }

    fn eval_sequence(&self, rules: &[Rule], input: &Input, offset: usize) -> Option<Match> {
        let mut children = Vec::with_capacity(rules.len());
        let mut cursor = offset;
        for r in rules {
            let m = input.match_rule(r, cursor)?;
            cursor += m.length();
            children.push(m);
        }
        Some(self.apply_self(Match::nonterminal(children)))
    }

    fn eval_choice(&self, rules: &[Rule], input: &Input, offset: usize) -> Option<Match> {
        for r in rules {
            if let Some(m) = input.match_rule(r, offset) {
                return Some(self.apply_self(Match::nonterminal(vec![m])));
            }
        }
        None
    }

    fn eval_repeat(&self, min: usize, max: Option<usize>, rule: &Rule, input: &Input, offset: usize) -> Option<Match> {
        let mut children = Vec::new();
        let mut cursor = offset;
        loop {
            if max.is_some_and(|max| children.len() >= max) {
                break;
            }
            match input.match_rule(rule, cursor) {
                Some(m) => {
                    let zero_width = m.length() == 0;
                    cursor += m.length();
                    children.push(m);
                    if zero_width && max.is_none() {
                        // A zero-width match can repeat forever without advancing
                        // the cursor; with no `max` to bound the loop, count it
                        // once and stop. With a bounded `max`, the top-of-loop
                        // check above is what terminates the loop once `max` is
                        // reached, exactly as a non-zero-width repeat would.
                        break;
                    }
                }
                None => break,
            }
        }
        let within_bounds = children.len() >= min && max.is_none_or(|max| children.len() <= max);
        if within_bounds {
            Some(self.apply_self(Match::nonterminal(children)))
        } else {
            None
        }
    }

    fn eval_and(&self, rule: &Rule, input: &Input, offset: usize) -> Option<Match> {
        input.match_rule(rule, offset)?;
        Some(self.apply_self(Match::empty()))
    }

    fn eval_not(&self, rule: &Rule, input: &Input, offset: usize) -> Option<Match> {
        match input.match_rule(rule, offset) {
            Some(_) => None,
            None => Some(self.apply_self(Match::empty())),
        }
    }

    fn eval_label(&self, label_name: &str, inner: &Rule, input: &Input, offset: usize) -> Option<Match> {
        let m = input.match_rule(inner, offset)?;
        let m = m.with_name(label_name.to_string());
        Some(match self.extension() {
            Some(ext) => m.with_extension(ext),
            None => m,
        })
    }

    fn eval_name_ref(&self, name_ref: &NameRef, input: &Input, offset: usize, is_super: bool) -> Option<Match> {
        let target = self.resolve_name_ref(name_ref, is_super);
        let m = input.match_rule(&target, offset)?;
        let m = match self.name() {
            Some(name) => m.with_name(name),
            None => m,
        };
        Some(match self.extension() {
            Some(ext) => m.with_extension(ext),
            None => m,
        })
    }

    fn resolve_name_ref(&self, name_ref: &NameRef, is_super: bool) -> Rule {
        if let Some(cached) = name_ref.resolved.borrow().as_ref() {
            return cached.clone();
        }
        let name = name_ref
            .name
            .borrow()
            .clone()
            .unwrap_or_else(|| panic!("{}", GrammarError::UnboundSuper));
        let grammar = self.grammar().unwrap_or_else(|| {
            panic!(
                "rule is not attached to a grammar; cannot resolve {} '{name}'",
                if is_super { "super reference" } else { "alias" }
            )
        });
        let resolved = if is_super { grammar.super_rule(&name) } else { grammar.rule(&name) }.unwrap_or_else(|| {
            let grammar_name = grammar.name();
            if is_super {
                panic!("{}", GrammarError::UnresolvedSuper { grammar: grammar_name, name: name.clone() })
            } else {
                panic!("{}", GrammarError::UnresolvedAlias { grammar: grammar_name, name: name.clone() })
            }
        });
        log::trace!(
            "resolved {} '{}' -> rule #{}",
            if is_super { "super" } else { "alias" },
            name,
            resolved.id().raw()
        );
        *name_ref.resolved.borrow_mut() = Some(resolved.clone());
        resolved
    }

    /// Renders this rule back to PEG notation. Named sub-rules (those
    /// installed under a grammar name) are not expanded; they render as
    /// their name, exactly like an explicit alias, since that is how a
    /// human-authored grammar would refer to them from anywhere but their
    /// own definition.
    pub fn to_peg(&self) -> String {
        match &self.0.kind {
            RuleKind::FixedWidth(s) => format!("\"{}\"", escape_literal(s)),
            RuleKind::Expression(re) => format!("/{}/", re.as_str()),
            RuleKind::Sequence(rules) => rules.iter().map(embed).collect::<Vec<_>>().join(" "),
            RuleKind::Choice(rules) => rules.iter().map(embed).collect::<Vec<_>>().join(" | "),
            RuleKind::Repeat { min, max, rule } => format!("{}{}", embed(rule), repeat_operator(*min, *max)),
            RuleKind::And(r) => format!("&{}", embed(r)),
            RuleKind::Not(r) => format!("!{}", embed(r)),
            RuleKind::Label(name, r) => format!("{name}:{}", embed(r)),
            RuleKind::Alias(a) => a.name.borrow().clone().unwrap_or_else(|| "<alias>".to_string()),
            RuleKind::Super(_) => "super".to_string(),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("id", &self.0.id.0).field("name", &self.name()).field("peg", &self.to_peg()).finish()
    }
}

fn escape_literal(s: &str) -> String {
    s.chars()
        .flat_map(|c| match c {
            '"' => vec!['\\', '"'],
            '\\' => vec!['\\', '\\'],
            '\n' => vec!['\\', 'n'],
            '\t' => vec!['\\', 't'],
            other => vec![other],
        })
        .collect()
}

/// Wraps `r`'s rendering in parentheses when embedding it inside another
/// rule's rendering would otherwise change its precedence (a multi-member
/// sequence or choice nested inside a repeat/predicate/label/other
/// sequence-or-choice).
fn embed(r: &Rule) -> String {
    let needs_parens = matches!(&r.0.kind, RuleKind::Sequence(rs) | RuleKind::Choice(rs) if rs.len() > 1);
    let rendered = r.to_peg();
    if needs_parens {
        format!("({rendered})")
    } else {
        rendered
    }
}

fn repeat_operator(min: usize, max: Option<usize>) -> String {
    match (min, max) {
        (0, Some(1)) => "?".to_string(),
        (1, None) => "+".to_string(),
        (0, None) => "*".to_string(),
        (n, Some(m)) => format!("{n}*{m}"),
        (n, None) => format!("{n}*"),
    }
}

/// A terminal matching a fixed literal string.
pub fn literal(s: impl Into<String>) -> Rule {
    Rule::new(RuleKind::FixedWidth(s.into()))
}

/// A terminal matching a compiled regex, anchored to the current offset.
/// Capture groups beyond group 0 become the resulting match's captures.
pub fn regex(pattern: &str) -> Result<Rule, HostError> {
    Regex::new(pattern)
        .map(|re| Rule::new(RuleKind::Expression(re)))
        .map_err(|source| HostError::RegexCompile { pattern: pattern.to_string(), source })
}

/// Wraps an already-compiled regex as an `Expression` rule. Infallible,
/// since the pattern has already been validated by the caller.
pub(crate) fn regex_compiled(re: Regex) -> Rule {
    Rule::new(RuleKind::Expression(re))
}

/// Matches each rule in order at consecutive offsets; fails if any member
/// fails. Produces one nonterminal match with one child per member.
pub fn seq(rules: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::new(RuleKind::Sequence(rules.into_iter().collect()))
}

/// Tries each alternative in order at the same offset, taking the first
/// success. Produces one nonterminal match with exactly one child.
pub fn alt(rules: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::new(RuleKind::Choice(rules.into_iter().collect()))
}

/// Matches `rule` repeatedly, between `min` and `max` times (`max = None`
/// for unbounded). Fails if `min` is not reached. A zero-width successful
/// match counts once and stops the repetition, rather than looping forever.
pub fn rep(rule: Rule, min: usize, max: Option<usize>) -> Result<Rule, GrammarError> {
    if let Some(max) = max {
        if min > max {
            return Err(GrammarError::InvalidRepeatBounds { min, max });
        }
    }
    Ok(Rule::new(RuleKind::Repeat { min, max, rule }))
}

/// `rep(rule, 1, None)`.
pub fn one_or_more(rule: Rule) -> Rule {
    rep(rule, 1, None).expect("min <= max always holds for fixed bounds")
}

/// `rep(rule, 0, None)`.
pub fn zero_or_more(rule: Rule) -> Rule {
    rep(rule, 0, None).expect("min <= max always holds for fixed bounds")
}

/// `rep(rule, 0, Some(1))`.
pub fn optional(rule: Rule) -> Rule {
    rep(rule, 0, Some(1)).expect("min <= max always holds for fixed bounds")
}

/// Zero-width lookahead: succeeds without consuming input iff `rule`
/// matches at the current offset.
pub fn and_pred(rule: Rule) -> Rule {
    Rule::new(RuleKind::And(rule))
}

/// Zero-width negative lookahead: succeeds without consuming input iff
/// `rule` does not match at the current offset.
pub fn not_pred(rule: Rule) -> Rule {
    Rule::new(RuleKind::Not(rule))
}

/// Delegates to `rule`, renaming its match to `name`.
pub fn label(name: impl Into<String>, rule: Rule) -> Rule {
    Rule::new(RuleKind::Label(name.into(), rule))
}

/// A proxy that resolves `name` to a rule in the same grammar (or its
/// ancestor chain) on first use.
pub fn alias(name: impl Into<String>) -> Rule {
    Rule::new(RuleKind::Alias(NameRef::fixed(name.into())))
}

/// A proxy that resolves, on first use, to the rule of the *same* name in
/// an ancestor grammar only. The name itself is filled in implicitly: it is
/// whatever name the enclosing rule is installed under by
/// [`crate::Grammar::define`].
pub fn super_ref() -> Rule {
    Rule::new(RuleKind::Super(NameRef::unbound()))
}
