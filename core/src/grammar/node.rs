use core::fmt;
use std::sync::Arc;

use super::{NodeId, RuleId};

/// Callback computing a token from the symbols matched beneath an [`Node::Emit`].
pub type EmitFn<S, T> = Arc<dyn Fn(&[S]) -> T + Send + Sync>;

/// Callback folding the tokens emitted beneath a [`Node::Reemit`] into one.
pub type ReemitFn<T> = Arc<dyn Fn(Vec<T>) -> T + Send + Sync>;

/// Callback invoked by a [`Node::Custom`] with the pending input symbol.
pub type HookFn<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// What an [`Node::Emit`] appends once its body completes.
pub enum Emission<S, T> {
    /// A fixed token, cloned on every completion.
    Token(T),
    /// A token derived from the symbols the body matched.
    With(EmitFn<S, T>),
}

impl<S, T: Clone> Clone for Emission<S, T> {
    fn clone(&self) -> Self {
        match self {
            Emission::Token(token) => Emission::Token(token.clone()),
            Emission::With(f) => Emission::With(Arc::clone(f)),
        }
    }
}

impl<S, T: fmt::Debug> fmt::Debug for Emission<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Emission::Token(token) => f.debug_tuple("Token").field(token).finish(),
            Emission::With(_) => f.write_str("With(<fn>)"),
        }
    }
}

/// A caller-supplied hook, mostly used for tracing.
///
/// The flags alone decide how the hook matches:
///
/// | `consumes_input` | `matches_without_input` | behaviour |
/// |---|---|---|
/// | `false` | `true`  | zero-width, always passes |
/// | `false` | `false` | zero-width, always fails |
/// | `true`  | `false` | consumes exactly one symbol, whatever it is |
/// | `true`  | `true`  | either of the above two passing forms |
///
/// The callback sees the pending symbol each time a branch reaches the hook
/// with input available. It never runs at end of input.
pub struct Hook<S> {
    /// Whether the hook may complete without consuming a symbol.
    pub matches_without_input: bool,
    /// Whether the hook may consume one symbol.
    pub consumes_input: bool,
    /// Invoked with the pending symbol.
    pub callback: HookFn<S>,
}

impl<S> Clone for Hook<S> {
    fn clone(&self) -> Self {
        Self {
            matches_without_input: self.matches_without_input,
            consumes_input: self.consumes_input,
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<S> fmt::Debug for Hook<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("matches_without_input", &self.matches_without_input)
            .field("consumes_input", &self.consumes_input)
            .finish_non_exhaustive()
    }
}

/// One element of a [`Grammar`](super::Grammar)'s node arena.
///
/// Children are addressed by [`NodeId`]; the only indirection that may form a
/// cycle is [`Node::Reference`], which goes through the rule table.
pub enum Node<S, T> {
    /// Matches the empty input.
    Empty,
    /// Consumes one symbol that is (or, when `negate`, is not) in `symbols`.
    TerminalSet {
        /// Invert the membership test.
        negate: bool,
        /// The set, compared by equality.
        symbols: Vec<S>,
    },
    /// Consumes exactly this run of symbols, one per step.
    TerminalLiteral {
        /// The run to match.
        symbols: Vec<S>,
    },
    /// Zero-width assertion on the next unconsumed symbol.
    ///
    /// At end of input a plain barrier fails and a negated one passes.
    Barrier {
        /// Invert the membership test.
        negate: bool,
        /// The set, compared by equality.
        symbols: Vec<S>,
    },
    /// All children in order.
    Sequence {
        /// Ordered children.
        children: Vec<NodeId>,
    },
    /// Every child as an independent alternative.
    Disjunction {
        /// Alternatives, with no priority among them.
        children: Vec<NodeId>,
    },
    /// Zero or more repetitions of `body`.
    Recurse {
        /// The repeated element.
        body: NodeId,
    },
    /// Exactly `count` repetitions of `body`.
    Repeat {
        /// The repeated element.
        body: NodeId,
        /// Number of repetitions.
        count: usize,
    },
    /// Indirection through the rule table.
    Reference {
        /// The referenced rule.
        rule: RuleId,
    },
    /// Appends a token once `body` completes.
    Emit {
        /// The emitting element.
        body: NodeId,
        /// The token or token constructor.
        emission: Emission<S, T>,
    },
    /// Replaces the tokens `body` emitted with a single folded token.
    Reemit {
        /// The capturing element.
        body: NodeId,
        /// Folds the captured tokens.
        merge: ReemitFn<T>,
    },
    /// A caller-supplied hook.
    Custom {
        /// Hook flags and callback.
        hook: Hook<S>,
    },
}

impl<S, T> Node<S, T> {
    /// Whether this node consumes input when a branch rests on it.
    #[inline]
    pub fn is_consuming(&self) -> bool {
        match self {
            Node::TerminalSet { .. } | Node::TerminalLiteral { .. } => true,
            Node::Custom { hook } => hook.consumes_input,
            _ => false,
        }
    }
}

/// Membership test shared by terminal sets and barriers.
#[inline]
pub(crate) fn set_matches<S: PartialEq>(negate: bool, symbols: &[S], symbol: &S) -> bool {
    symbols.contains(symbol) != negate
}

impl<S: fmt::Debug, T: fmt::Debug> fmt::Debug for Node<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Empty => f.write_str("Empty"),
            Node::TerminalSet { negate, symbols } => f
                .debug_struct("TerminalSet")
                .field("negate", negate)
                .field("symbols", symbols)
                .finish(),
            Node::TerminalLiteral { symbols } => f
                .debug_struct("TerminalLiteral")
                .field("symbols", symbols)
                .finish(),
            Node::Barrier { negate, symbols } => f
                .debug_struct("Barrier")
                .field("negate", negate)
                .field("symbols", symbols)
                .finish(),
            Node::Sequence { children } => {
                f.debug_struct("Sequence").field("children", children).finish()
            }
            Node::Disjunction { children } => f
                .debug_struct("Disjunction")
                .field("children", children)
                .finish(),
            Node::Recurse { body } => f.debug_struct("Recurse").field("body", body).finish(),
            Node::Repeat { body, count } => f
                .debug_struct("Repeat")
                .field("body", body)
                .field("count", count)
                .finish(),
            Node::Reference { rule } => f.debug_struct("Reference").field("rule", rule).finish(),
            Node::Emit { body, emission } => f
                .debug_struct("Emit")
                .field("body", body)
                .field("emission", emission)
                .finish(),
            Node::Reemit { body, .. } => f
                .debug_struct("Reemit")
                .field("body", body)
                .finish_non_exhaustive(),
            Node::Custom { hook } => f.debug_struct("Custom").field("hook", hook).finish(),
        }
    }
}
