//! Core error types for thicket.
//!
//! Two families of failure exist:
//!
//! - [`Error`]: the grammar was built incorrectly, or a configured resource
//!   limit was hit while feeding symbols. These are programming or
//!   configuration errors on the integrator's side.
//! - [`Rejection`]: the input did not match the grammar (or matched it in
//!   more than one way). This is the verdict produced when a forest is
//!   finished.
//!
//! Integrators with their own error enums should wrap both, e.g.
//!
//! ```ignore
//! use thiserror::Error;
//!
//! #[derive(Error, Debug)]
//! pub enum MyError {
//!     #[error(transparent)]
//!     Grammar(#[from] thicket::Error),
//!
//!     #[error(transparent)]
//!     Rejected(#[from] thicket::Rejection),
//! }
//! ```

use thiserror::Error;

/// Core thicket error type.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A rule was declared with [`GrammarBuilder::declare`] but never given
    /// a body.
    ///
    /// [`GrammarBuilder::declare`]: crate::GrammarBuilder::declare
    #[error("rule `{name}` was declared but never defined")]
    UndefinedRule {
        /// Name the rule was declared with.
        name: String,
    },

    /// A rule was given a body more than once.
    #[error("rule `{name}` is already defined")]
    RuleRedefined {
        /// Name the rule was declared with.
        name: String,
    },

    /// A rule can reach itself without consuming any input.
    ///
    /// Feeding such a grammar would never finish resolving the zero-width
    /// steps, so it is refused at build time instead.
    #[error("rule `{name}` is left-recursive: it can reach itself without consuming input")]
    LeftRecursion {
        /// Name of a rule on the offending cycle.
        name: String,
    },

    /// A branch nested deeper than the configured limit.
    ///
    /// Depth is counted in engine frames, which grow with the nesting of the
    /// grammar constructs currently open on a branch.
    #[error("recursion limit exceeded: depth {depth} > limit {limit}")]
    RecursionLimitExceeded {
        /// Depth reached when the limit was exceeded.
        depth: usize,
        /// Maximum allowed depth.
        limit: usize,
    },

    /// More candidate derivations were alive at once than allowed.
    #[error("branch limit exceeded: {count} live branches > limit {limit}")]
    BranchLimitExceeded {
        /// Number of live branches when the limit was exceeded.
        count: usize,
        /// Maximum allowed live branches.
        limit: usize,
    },

    /// More symbols were fed than allowed.
    #[error("symbol limit exceeded: consumed {consumed} > limit {limit}")]
    SymbolLimitExceeded {
        /// Number of symbols fed when the limit was exceeded.
        consumed: usize,
        /// Maximum allowed symbol count.
        limit: usize,
    },
}

/// Why a finished forest did not produce exactly one derivation.
///
/// The [`Display`](core::fmt::Display) output is the human-readable
/// diagnostic written by [`finalise`](crate::finalise); it is never empty.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// No branch reached a complete state.
    #[error("syntax error: input does not match the grammar after {consumed} symbols")]
    Syntax {
        /// Number of symbols fed before finishing.
        consumed: usize,
    },

    /// More than one structurally distinct branch reached a complete state.
    #[error("ambiguous input: {derivations} distinct derivations match all {consumed} symbols")]
    Ambiguous {
        /// Number of distinct complete derivations.
        derivations: usize,
        /// Number of symbols fed before finishing.
        consumed: usize,
    },

    /// Feeding stopped early because a configured limit was exceeded.
    #[error("parse aborted: {reason}")]
    Aborted {
        /// The limit violation reported by [`Forest::feed`](crate::Forest::feed).
        reason: Error,
    },
}
