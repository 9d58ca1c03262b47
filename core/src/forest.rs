//! The caller-owned parse state.
//!
//! A [`Forest`] holds every live [`Branch`] of one parse. It is advanced one
//! symbol at a time by [`Forest::feed`] (or the free function [`parse`]) and
//! closed by [`Forest::finish`] (or [`finalise`](crate::finalise)).
//!
//! Because the forest owns all state between calls, a parse can be paused
//! for as long as the caller likes: feeding symbol *k + 1* depends only on the
//! branches alive after symbol *k*.
//!
//! # Example
//!
//! ```ignore
//! let grammar = Arc::new(builder.build(start)?);
//! let mut forest = Forest::new(grammar);
//! for ch in input.chars() {
//!     forest.feed(ch)?;
//! }
//! let tokens = forest.finish()?;
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use crate::branch::Branch;
use crate::config::ParseConfig;
use crate::grammar::Grammar;
use crate::step::Stepper;
use crate::Error;

/// Every live candidate derivation of one parse.
#[derive(Debug)]
pub struct Forest<S, T> {
    pub(crate) grammar: Arc<Grammar<S, T>>,
    pub(crate) config: ParseConfig,
    pub(crate) branches: Vec<Branch<S, T>>,
    pub(crate) consumed: usize,
    /// Set once a limit is exceeded; the forest then refuses further input.
    pub(crate) aborted: Option<Error>,
}

impl<S, T> Forest<S, T> {
    /// A fresh forest with the default [`ParseConfig`].
    pub fn new(grammar: Arc<Grammar<S, T>>) -> Self {
        Self::with_config(grammar, ParseConfig::default())
    }

    /// A fresh forest bounded by `config`.
    pub fn with_config(grammar: Arc<Grammar<S, T>>, config: ParseConfig) -> Self {
        let start = grammar.start();
        Self {
            grammar,
            config,
            branches: vec![Branch::new(start)],
            consumed: 0,
            aborted: None,
        }
    }

    /// The grammar this forest runs.
    #[inline]
    pub fn grammar(&self) -> &Arc<Grammar<S, T>> {
        &self.grammar
    }

    /// The limits this forest enforces.
    #[inline]
    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    /// Number of symbols fed so far.
    #[inline]
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Number of live branches.
    #[inline]
    pub fn live_branches(&self) -> usize {
        self.branches.len()
    }

    /// The live branches, in no particular order.
    #[inline]
    pub fn branches(&self) -> &[Branch<S, T>] {
        &self.branches
    }

    /// `true` once no branch is left: the input can no longer be accepted,
    /// whatever follows.
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.branches.is_empty()
    }

    /// The limit violation that stopped this forest, if any.
    #[inline]
    pub fn aborted(&self) -> Option<&Error> {
        self.aborted.as_ref()
    }

    /// Drops all branches and starts over from the grammar's start node.
    pub fn reset(&mut self) {
        self.branches.clear();
        self.branches.push(Branch::new(self.grammar.start()));
        self.consumed = 0;
        self.aborted = None;
    }

    pub(crate) fn abort(&mut self, reason: Error) -> Error {
        log::debug!("forest aborted after {} symbols: {}", self.consumed, reason);
        self.branches.clear();
        self.aborted = Some(reason.clone());
        reason
    }
}

impl<S, T> Forest<S, T>
where
    S: Clone + PartialEq,
    T: Clone,
{
    /// Advances every live branch by `symbol`.
    ///
    /// Branches whose next required match fails are dropped; alternations
    /// reached on the way fork new branches. An `Err` is only returned when a
    /// configured limit is exceeded, after which the forest is aborted: it
    /// ignores further input and [`finish`](Forest::finish) rejects.
    pub fn feed(&mut self, symbol: S) -> Result<(), Error> {
        if let Some(reason) = &self.aborted {
            return Err(reason.clone());
        }
        if self.consumed >= self.config.max_symbols {
            return Err(self.abort(Error::SymbolLimitExceeded {
                consumed: self.consumed + 1,
                limit: self.config.max_symbols,
            }));
        }

        let before = self.branches.len();
        match self.step(&symbol) {
            Ok(next) => self.branches = next,
            Err(reason) => return Err(self.abort(reason)),
        }
        self.consumed += 1;

        log::trace!(
            "symbol {}: {} -> {} live branches",
            self.consumed,
            before,
            self.branches.len()
        );
        if self.branches.len() > self.config.max_branches {
            return Err(self.abort(Error::BranchLimitExceeded {
                count: self.branches.len(),
                limit: self.config.max_branches,
            }));
        }
        Ok(())
    }

    /// Feeds every symbol of `symbols`, stopping at the first limit error.
    pub fn feed_all(&mut self, symbols: impl IntoIterator<Item = S>) -> Result<(), Error> {
        symbols.into_iter().try_for_each(|symbol| self.feed(symbol))
    }

    fn step(&mut self, symbol: &S) -> Result<Vec<Branch<S, T>>, Error> {
        let stepper = Stepper::new(&self.grammar, &self.config, self.consumed);
        let mut settled = Vec::with_capacity(self.branches.len());
        for branch in self.branches.drain(..) {
            stepper.settle(branch, Some(symbol), &mut settled)?;
        }
        let mut next: Vec<_> = settled
            .into_iter()
            .filter_map(|branch| stepper.advance(branch, symbol))
            .collect();
        collapse_duplicates(&mut next);
        Ok(next)
    }
}

/// Feeds one symbol to `forest`. Free-function form of [`Forest::feed`].
#[inline]
pub fn parse<S, T>(symbol: S, forest: &mut Forest<S, T>) -> Result<(), Error>
where
    S: Clone + PartialEq,
    T: Clone,
{
    forest.feed(symbol)
}

/// Keeps the first of every group of branches with the same position and
/// derivation. Structurally different derivations are never merged.
pub(crate) fn collapse_duplicates<S, T>(branches: &mut Vec<Branch<S, T>>) {
    if branches.len() < 2 {
        return;
    }
    let keep: Vec<bool> = {
        let mut seen = HashSet::with_capacity(branches.len());
        branches.iter().map(|branch| seen.insert(branch.key())).collect()
    };
    let mut keep = keep.into_iter();
    branches.retain(|_| keep.next().unwrap_or(true));
}
