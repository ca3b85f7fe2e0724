//! The [`Match`] tree produced by a successful rule match: a text span,
//! child matches, capture groups, an optional name, and an optional
//! extension tag.
//!
//! A nonterminal's text is always the concatenation of its children's text,
//! in order — this is computed lazily on first access and cached, rather
//! than copied eagerly at construction, since most nonterminal matches are
//! never inspected directly (only their named descendants are).

use std::cell::OnceCell;
use std::rc::Rc;

use crate::engine::rule::ExtensionTag;

enum MatchText {
    Eager(Rc<str>),
    Lazy(OnceCell<Rc<str>>),
}

struct MatchData {
    text: MatchText,
    children: Vec<Match>,
    captures: Vec<String>,
    name: Option<String>,
    extension: Option<ExtensionTag>,
}

/// A node in the tree produced by a successful match. Cheap to clone (an
/// `Rc` handle).
#[derive(Clone)]
pub struct Match(Rc<MatchData>);

impl Match {
    pub(crate) fn terminal(text: impl Into<String>) -> Match {
        Match::terminal_with_captures(text, Vec::new())
    }

    pub(crate) fn terminal_with_captures(text: impl Into<String>, captures: Vec<String>) -> Match {
        Match(Rc::new(MatchData {
            text: MatchText::Eager(Rc::from(text.into())),
            children: Vec::new(),
            captures,
            name: None,
            extension: None,
        }))
    }

    pub(crate) fn nonterminal(children: Vec<Match>) -> Match {
        Match(Rc::new(MatchData {
            text: MatchText::Lazy(OnceCell::new()),
            children,
            captures: Vec::new(),
            name: None,
            extension: None,
        }))
    }

    /// A zero-width, childless match: what `AndPredicate`/`NotPredicate`
    /// produce on success.
    pub(crate) fn empty() -> Match {
        Match::nonterminal(Vec::new())
    }

    /// The text this match consumed: `input[offset, offset + length]` of
    /// whichever input produced it. For a nonterminal, this is the
    /// concatenation of its children's text, computed once and cached.
    pub fn text(&self) -> &str {
        match &self.0.text {
            MatchText::Eager(s) => s.as_ref(),
            MatchText::Lazy(cell) => {
                let s = cell.get_or_init(|| {
                    let joined: String = self.0.children.iter().map(Match::text).collect();
                    Rc::from(joined)
                });
                s.as_ref()
            }
        }
    }

    /// `self.text().len()`, in bytes.
    pub fn length(&self) -> usize {
        self.text().len()
    }

    /// This match's immediate children, in match order.
    pub fn children(&self) -> &[Match] {
        &self.0.children
    }

    /// Regex capture groups (1-indexed in the source pattern, exposed
    /// 0-indexed here); empty unless this match came from an `Expression`
    /// rule whose pattern had groups.
    pub fn captures(&self) -> &[String] {
        &self.0.captures
    }

    /// The name set by the originating rule, or overridden by an enclosing
    /// `Label` or named `Alias`/`Super`.
    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    /// The extension tag inherited from the originating rule, if any.
    pub fn extension(&self) -> Option<ExtensionTag> {
        self.0.extension
    }

    /// True iff this match has no children (a `FixedWidth`/`Expression`
    /// match, or a predicate's empty match).
    pub fn is_terminal(&self) -> bool {
        self.0.children.is_empty()
    }

    /// Immediate children named `name`, in order. When `deep` is true,
    /// searches the full subtree in pre-order instead of just the
    /// immediate children.
    pub fn find(&self, name: &str, deep: bool) -> Vec<Match> {
        let mut out = Vec::new();
        if deep {
            self.find_deep_into(name, &mut out);
        } else {
            out.extend(self.0.children.iter().filter(|c| c.name() == Some(name)).cloned());
        }
        out
    }

    fn find_deep_into(&self, name: &str, out: &mut Vec<Match>) {
        for c in &self.0.children {
            if c.name() == Some(name) {
                out.push(c.clone());
            }
            c.find_deep_into(name, out);
        }
    }

    /// The first immediate child named `name`, or the first immediate child
    /// at all when `name` is `None`.
    pub fn first(&self, name: Option<&str>) -> Option<Match> {
        match name {
            Some(n) => self.0.children.iter().find(|c| c.name() == Some(n)).cloned(),
            None => self.0.children.first().cloned(),
        }
    }

    /// Returns a copy of this match with its name overridden. Does not
    /// mutate `self` (or any other clone sharing its packrat cache entry) —
    /// two labels pointing at the same cached sub-match must not end up
    /// with the same name.
    pub(crate) fn with_name(&self, name: impl Into<String>) -> Match {
        self.clone_with(Some(name.into()), self.0.extension)
    }

    pub(crate) fn with_extension(&self, tag: ExtensionTag) -> Match {
        self.clone_with(self.0.name.clone(), Some(tag))
    }

    fn clone_with(&self, name: Option<String>, extension: Option<ExtensionTag>) -> Match {
        Match(Rc::new(MatchData {
            text: MatchText::Eager(Rc::from(self.text())),
            children: self.0.children.clone(),
            captures: self.0.captures.clone(),
            name,
            extension,
        }))
    }
}

impl PartialEq<str> for Match {
    fn eq(&self, other: &str) -> bool {
        self.text() == other
    }
}

impl PartialEq<&str> for Match {
    fn eq(&self, other: &&str) -> bool {
        self.text() == *other
    }
}

impl std::fmt::Debug for Match {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Match")
            .field("name", &self.name())
            .field("text", &self.text())
            .field("children", &self.0.children.len())
            .finish()
    }
}
