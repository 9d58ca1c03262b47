//! Grammar expressions and their factory functions.
//!
//! An [`Expr`] is an owned description of a grammar fragment. Expressions are
//! cheap to build and compose; they become part of an immutable
//! [`Grammar`](super::Grammar) only when handed to a
//! [`GrammarBuilder`](super::GrammarBuilder).
//!
//! # Example
//!
//! ```ignore
//! use thicket::grammar::expr::*;
//!
//! // digits separated by commas, each digit emitted as a token
//! let digit = terminal_any('0'..='9').emit_with(|s: &[char]| s[0]);
//! let list = digit.clone() + (terminal_any([',']) + digit).many();
//! ```
//!
//! Composition operators:
//!
//! | operator | meaning |
//! |---|---|
//! | `a + b` | `a` then `b` ([`sequence`]) |
//! | `a \| b` | `a` or `b` ([`disjunction`]) |

use core::ops::{Add, BitOr};
use std::sync::Arc;

use super::RuleId;
use super::node::{Emission, Hook};

/// An owned grammar fragment.
///
/// Each variant mirrors a [`Node`](super::Node) kind, with children held
/// inline instead of by [`NodeId`](super::NodeId).
pub enum Expr<S, T> {
    /// See [`empty`].
    Empty,
    /// See [`terminal_any`] and [`terminal_not`].
    TerminalSet {
        /// Invert the membership test.
        negate: bool,
        /// The set.
        symbols: Vec<S>,
    },
    /// See [`terminal`].
    TerminalLiteral {
        /// The run to match.
        symbols: Vec<S>,
    },
    /// See [`barrier_any`] and [`barrier_not`].
    Barrier {
        /// Invert the membership test.
        negate: bool,
        /// The set.
        symbols: Vec<S>,
    },
    /// See [`sequence`].
    Sequence(Vec<Expr<S, T>>),
    /// See [`disjunction`].
    Disjunction(Vec<Expr<S, T>>),
    /// See [`recurse`].
    Recurse(Box<Expr<S, T>>),
    /// See [`repeat`].
    Repeat(Box<Expr<S, T>>, usize),
    /// See [`reference`].
    Reference(RuleId),
    /// See [`emit`] and [`emit_with`].
    Emit(Box<Expr<S, T>>, Emission<S, T>),
    /// See [`reemit`].
    Reemit(Box<Expr<S, T>>, super::node::ReemitFn<T>),
    /// See [`custom`].
    Custom(Hook<S>),
}

impl<S: Clone, T: Clone> Clone for Expr<S, T> {
    fn clone(&self) -> Self {
        match self {
            Expr::Empty => Expr::Empty,
            Expr::TerminalSet { negate, symbols } => Expr::TerminalSet {
                negate: *negate,
                symbols: symbols.clone(),
            },
            Expr::TerminalLiteral { symbols } => Expr::TerminalLiteral {
                symbols: symbols.clone(),
            },
            Expr::Barrier { negate, symbols } => Expr::Barrier {
                negate: *negate,
                symbols: symbols.clone(),
            },
            Expr::Sequence(children) => Expr::Sequence(children.clone()),
            Expr::Disjunction(children) => Expr::Disjunction(children.clone()),
            Expr::Recurse(body) => Expr::Recurse(body.clone()),
            Expr::Repeat(body, count) => Expr::Repeat(body.clone(), *count),
            Expr::Reference(rule) => Expr::Reference(*rule),
            Expr::Emit(body, emission) => Expr::Emit(body.clone(), emission.clone()),
            Expr::Reemit(body, merge) => Expr::Reemit(body.clone(), Arc::clone(merge)),
            Expr::Custom(hook) => Expr::Custom(hook.clone()),
        }
    }
}

impl<S: core::fmt::Debug, T: core::fmt::Debug> core::fmt::Debug for Expr<S, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Expr::Empty => f.write_str("Empty"),
            Expr::TerminalSet { negate, symbols } => f
                .debug_struct("TerminalSet")
                .field("negate", negate)
                .field("symbols", symbols)
                .finish(),
            Expr::TerminalLiteral { symbols } => f
                .debug_struct("TerminalLiteral")
                .field("symbols", symbols)
                .finish(),
            Expr::Barrier { negate, symbols } => f
                .debug_struct("Barrier")
                .field("negate", negate)
                .field("symbols", symbols)
                .finish(),
            Expr::Sequence(children) => f.debug_tuple("Sequence").field(children).finish(),
            Expr::Disjunction(children) => f.debug_tuple("Disjunction").field(children).finish(),
            Expr::Recurse(body) => f.debug_tuple("Recurse").field(body).finish(),
            Expr::Repeat(body, count) => f.debug_tuple("Repeat").field(body).field(count).finish(),
            Expr::Reference(rule) => f.debug_tuple("Reference").field(rule).finish(),
            Expr::Emit(body, emission) => {
                f.debug_tuple("Emit").field(body).field(emission).finish()
            }
            Expr::Reemit(body, _) => f.debug_tuple("Reemit").field(body).finish_non_exhaustive(),
            Expr::Custom(hook) => f.debug_tuple("Custom").field(hook).finish(),
        }
    }
}

// =============================================================================
// Factory functions
// =============================================================================

/// Matches the empty input.
#[inline]
pub fn empty<S, T>() -> Expr<S, T> {
    Expr::Empty
}

/// Consumes one symbol contained in `symbols`.
pub fn terminal_any<S, T>(symbols: impl IntoIterator<Item = S>) -> Expr<S, T> {
    Expr::TerminalSet {
        negate: false,
        symbols: symbols.into_iter().collect(),
    }
}

/// Consumes one symbol **not** contained in `symbols`.
pub fn terminal_not<S, T>(symbols: impl IntoIterator<Item = S>) -> Expr<S, T> {
    Expr::TerminalSet {
        negate: true,
        symbols: symbols.into_iter().collect(),
    }
}

/// Consumes any one symbol.
#[inline]
pub fn any<S, T>() -> Expr<S, T> {
    Expr::TerminalSet {
        negate: true,
        symbols: Vec::new(),
    }
}

/// Consumes exactly the run `symbols`, in order.
///
/// An empty run behaves like [`empty`].
pub fn terminal<S, T>(symbols: impl IntoIterator<Item = S>) -> Expr<S, T> {
    Expr::TerminalLiteral {
        symbols: symbols.into_iter().collect(),
    }
}

/// Asserts, without consuming, that the next symbol is in `symbols`.
///
/// Fails at end of input.
pub fn barrier_any<S, T>(symbols: impl IntoIterator<Item = S>) -> Expr<S, T> {
    Expr::Barrier {
        negate: false,
        symbols: symbols.into_iter().collect(),
    }
}

/// Asserts, without consuming, that the next symbol is **not** in `symbols`.
///
/// Passes at end of input.
pub fn barrier_not<S, T>(symbols: impl IntoIterator<Item = S>) -> Expr<S, T> {
    Expr::Barrier {
        negate: true,
        symbols: symbols.into_iter().collect(),
    }
}

/// Matches every child in order with no gaps.
pub fn sequence<S, T>(children: impl IntoIterator<Item = Expr<S, T>>) -> Expr<S, T> {
    Expr::Sequence(children.into_iter().collect())
}

/// Matches any child. All children are explored in parallel.
pub fn disjunction<S, T>(children: impl IntoIterator<Item = Expr<S, T>>) -> Expr<S, T> {
    Expr::Disjunction(children.into_iter().collect())
}

/// Matches `body` zero or more times.
///
/// An iteration of `body` that consumes nothing ends the repetition, so a
/// nullable body is allowed.
pub fn recurse<S, T>(body: Expr<S, T>) -> Expr<S, T> {
    Expr::Recurse(Box::new(body))
}

/// Matches `body` exactly `count` times.
pub fn repeat<S, T>(body: Expr<S, T>, count: usize) -> Expr<S, T> {
    Expr::Repeat(Box::new(body), count)
}

/// Matches whatever `rule` is (or will be) defined as.
///
/// The rule must have been declared with
/// [`GrammarBuilder::declare`](super::GrammarBuilder::declare); it may be
/// defined later, and may refer to itself.
///
/// Ids are not tagged with their builder: a `rule` declared on a different
/// builder fails [`build`](super::GrammarBuilder::build) as undefined when it
/// is out of range, and otherwise silently names whichever rule shares its
/// index.
#[inline]
pub fn reference<S, T>(rule: RuleId) -> Expr<S, T> {
    Expr::Reference(rule)
}

/// Appends `token` once `body` completes.
pub fn emit<S, T>(body: Expr<S, T>, token: T) -> Expr<S, T> {
    Expr::Emit(Box::new(body), Emission::Token(token))
}

/// Appends `f(matched)` once `body` completes, where `matched` holds the
/// symbols `body` consumed.
pub fn emit_with<S, T, F>(body: Expr<S, T>, f: F) -> Expr<S, T>
where
    F: Fn(&[S]) -> T + Send + Sync + 'static,
{
    Expr::Emit(Box::new(body), Emission::With(Arc::new(f)))
}

/// Replaces the tokens emitted by `body` with `f(tokens)` once `body`
/// completes.
pub fn reemit<S, T, F>(body: Expr<S, T>, f: F) -> Expr<S, T>
where
    F: Fn(Vec<T>) -> T + Send + Sync + 'static,
{
    Expr::Reemit(Box::new(body), Arc::new(f))
}

/// A caller-supplied hook. See [`Hook`] for how the flags decide matching.
pub fn custom<S, T, F>(matches_without_input: bool, consumes_input: bool, callback: F) -> Expr<S, T>
where
    F: Fn(&S) + Send + Sync + 'static,
{
    Expr::Custom(Hook {
        matches_without_input,
        consumes_input,
        callback: Arc::new(callback),
    })
}

// =============================================================================
// Composition
// =============================================================================

impl<S, T> Expr<S, T> {
    /// Appends `token` once `self` completes.
    #[inline]
    pub fn emit(self, token: T) -> Self {
        emit(self, token)
    }

    /// Appends `f(matched symbols)` once `self` completes.
    #[inline]
    pub fn emit_with<F>(self, f: F) -> Self
    where
        F: Fn(&[S]) -> T + Send + Sync + 'static,
    {
        emit_with(self, f)
    }

    /// Folds the tokens `self` emits into one token.
    #[inline]
    pub fn capture<F>(self, f: F) -> Self
    where
        F: Fn(Vec<T>) -> T + Send + Sync + 'static,
    {
        reemit(self, f)
    }

    /// Zero or more repetitions of `self`.
    #[inline]
    pub fn many(self) -> Self {
        recurse(self)
    }

    /// Exactly `count` repetitions of `self`.
    #[inline]
    pub fn repeat(self, count: usize) -> Self {
        repeat(self, count)
    }

    /// `self` or nothing.
    #[inline]
    pub fn optional(self) -> Self {
        self | empty()
    }
}

impl<S, T> Add for Expr<S, T> {
    type Output = Expr<S, T>;

    /// `a + b` matches `a` then `b`. Chains flatten into one sequence.
    fn add(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Expr::Sequence(mut lhs), Expr::Sequence(rhs)) => {
                lhs.extend(rhs);
                Expr::Sequence(lhs)
            }
            (Expr::Sequence(mut lhs), rhs) => {
                lhs.push(rhs);
                Expr::Sequence(lhs)
            }
            (lhs, Expr::Sequence(mut rhs)) => {
                rhs.insert(0, lhs);
                Expr::Sequence(rhs)
            }
            (lhs, rhs) => Expr::Sequence(vec![lhs, rhs]),
        }
    }
}

impl<S, T> BitOr for Expr<S, T> {
    type Output = Expr<S, T>;

    /// `a | b` matches `a` or `b`. Chains flatten into one disjunction.
    fn bitor(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Expr::Disjunction(mut lhs), Expr::Disjunction(rhs)) => {
                lhs.extend(rhs);
                Expr::Disjunction(lhs)
            }
            (Expr::Disjunction(mut lhs), rhs) => {
                lhs.push(rhs);
                Expr::Disjunction(lhs)
            }
            (lhs, Expr::Disjunction(mut rhs)) => {
                rhs.insert(0, lhs);
                Expr::Disjunction(rhs)
            }
            (lhs, rhs) => Expr::Disjunction(vec![lhs, rhs]),
        }
    }
}
