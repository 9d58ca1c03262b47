//! One candidate derivation of a grammar against the input so far.

use core::fmt;
use core::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::grammar::NodeId;

/// An open grammar construct on a branch's stack.
///
/// What `state` means depends on the node kind:
///
/// - sequence / fixed repetition: index of the child (iteration) in progress
/// - unbounded repetition: number of symbols consumed when the current
///   iteration started
/// - literal: number of symbols of the run matched so far
/// - everything else: unused
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Frame {
    pub(crate) node: NodeId,
    pub(crate) state: usize,
    /// Absolute symbol index at which the construct was entered.
    pub(crate) symbol_mark: usize,
    /// Length of the token list when the construct was entered.
    pub(crate) token_mark: usize,
}

impl Frame {
    #[inline]
    pub(crate) fn new(node: NodeId, consumed: usize, tokens: usize) -> Self {
        Self {
            node,
            state: 0,
            symbol_mark: consumed,
            token_mark: tokens,
        }
    }
}

/// The way a branch went at a fork: which `alternative` of `node` it took
/// after `at` symbols.
///
/// For a loop, alternative 0 leaves and 1 runs another iteration. For a hook
/// that may also pass without input, 0 passes through and 1 consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Choice {
    pub(crate) node: NodeId,
    pub(crate) alternative: usize,
    pub(crate) at: usize,
}

/// Append-only log of every [`Choice`] a branch made.
///
/// Forks share the prefix they had in common, so cloning is O(1). Two branches
/// with equal logs followed the same derivation.
#[derive(Clone, Default)]
pub(crate) struct Derivation(Option<Arc<Link>>);

struct Link {
    choice: Choice,
    len: usize,
    prev: Derivation,
}

impl Derivation {
    pub(crate) fn push(&mut self, choice: Choice) {
        let prev = core::mem::take(self);
        let len = prev.len() + 1;
        self.0 = Some(Arc::new(Link { choice, len, prev }));
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.0.as_ref().map_or(0, |link| link.len)
    }

    /// Newest first.
    fn links(&self) -> impl Iterator<Item = &Link> {
        core::iter::successors(self.0.as_deref(), |link| link.prev.0.as_deref())
    }
}

impl PartialEq for Derivation {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let (mut a, mut b) = (self.0.as_ref(), other.0.as_ref());
        while let (Some(x), Some(y)) = (a, b) {
            if Arc::ptr_eq(x, y) {
                return true;
            }
            if x.choice != y.choice {
                return false;
            }
            a = x.prev.0.as_ref();
            b = y.prev.0.as_ref();
        }
        true
    }
}

impl Eq for Derivation {}

impl Hash for Derivation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        if let Some(link) = &self.0 {
            link.choice.hash(state);
        }
    }
}

impl Drop for Derivation {
    fn drop(&mut self) {
        // Unlink iteratively; a long log would otherwise recurse once per entry
        let mut next = self.0.take();
        while let Some(link) = next {
            next = match Arc::try_unwrap(link) {
                Ok(mut link) => link.prev.0.take(),
                Err(_) => None,
            };
        }
    }
}

impl fmt::Debug for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut choices: Vec<_> = self.links().map(|link| link.choice).collect();
        choices.reverse();
        f.debug_list().entries(choices).finish()
    }
}

/// A cursor through a grammar for one candidate derivation.
///
/// Branches are plain data: cloning one at an alternation yields a fully
/// independent copy.
#[derive(Debug, Clone)]
pub struct Branch<S, T> {
    pub(crate) frames: Vec<Frame>,
    /// Node to enter before anything else happens.
    pub(crate) pending: Option<NodeId>,
    /// Symbols consumed while an emission callback is open.
    pub(crate) symbols: Vec<S>,
    /// Absolute index of `symbols[0]`.
    pub(crate) symbol_base: usize,
    /// Number of open frames whose emission reads `symbols`.
    pub(crate) capturing: usize,
    pub(crate) tokens: Vec<T>,
    /// Every choice made at a fork so far.
    pub(crate) derivation: Derivation,
}

impl<S, T> Branch<S, T> {
    /// A branch about to enter `start`.
    pub(crate) fn new(start: NodeId) -> Self {
        Self {
            frames: Vec::new(),
            pending: Some(start),
            symbols: Vec::new(),
            symbol_base: 0,
            capturing: 0,
            tokens: Vec::new(),
            derivation: Derivation::default(),
        }
    }

    /// Whether nothing is left to match on this branch.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.frames.is_empty() && self.pending.is_none()
    }

    /// Number of open frames.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Tokens emitted so far, in emission order.
    #[inline]
    pub fn tokens(&self) -> &[T] {
        &self.tokens
    }

    pub(crate) fn into_tokens(self) -> Vec<T> {
        self.tokens
    }

    /// Appends a consumed symbol if an emission is listening.
    #[inline]
    pub(crate) fn record(&mut self, symbol: &S)
    where
        S: Clone,
    {
        if self.capturing > 0 {
            self.symbols.push(symbol.clone());
        }
    }

    /// Starts listening for an emission callback opened at `consumed`.
    pub(crate) fn open_capture(&mut self, consumed: usize) {
        if self.capturing == 0 {
            self.symbols.clear();
            self.symbol_base = consumed;
        }
        self.capturing += 1;
    }

    /// Stops listening for one emission callback.
    pub(crate) fn close_capture(&mut self) {
        self.capturing = self.capturing.saturating_sub(1);
        if self.capturing == 0 {
            self.symbols.clear();
        }
    }

    /// Symbols consumed since absolute index `mark`.
    #[inline]
    pub(crate) fn symbols_since(&self, mark: usize) -> &[S] {
        let start = mark.saturating_sub(self.symbol_base).min(self.symbols.len());
        &self.symbols[start..]
    }

    #[inline]
    pub(crate) fn push_token(&mut self, token: T) {
        self.tokens.push(token);
    }

    /// Records that this branch took `alternative` at the fork on `node`.
    #[inline]
    pub(crate) fn choose(&mut self, node: NodeId, alternative: usize, at: usize) {
        self.derivation.push(Choice {
            node,
            alternative,
            at,
        });
    }

    /// Identity used to collapse duplicates.
    pub(crate) fn key(&self) -> BranchKey<'_> {
        BranchKey {
            frames: &self.frames,
            pending: self.pending,
            derivation: &self.derivation,
        }
    }
}

/// Borrowed identity of a branch: position plus derivation.
/// Tokens and the symbol buffer are implied by both.
#[derive(Debug, PartialEq, Eq, Hash)]
pub(crate) struct BranchKey<'a> {
    frames: &'a [Frame],
    pending: Option<NodeId>,
    derivation: &'a Derivation,
}
