//! Forest configuration for resource limits.
//!
//! This module provides [`ParseConfig`] for bounding how much work a
//! [`Forest`](crate::Forest) may do.
//!
//! # Limits
//!
//! The engine explores every alternative of every disjunction in parallel, so
//! a pathological grammar can grow the number of live branches without bound.
//! Likewise deeply nested input grows each branch's frame stack. Neither is
//! an error in itself, so every limit is opt-in and unbounded by default.
//! Frames live on the heap, so nesting depth never risks the call stack.
//!
//! # Example
//!
//! ```ignore
//! use thicket_core::config::ParseConfig;
//!
//! // Default limits (all unbounded)
//! let config = ParseConfig::default();
//!
//! // Cap ambiguity growth and nesting for untrusted input
//! let config = ParseConfig::new()
//!     .with_max_recursion_depth(1024)
//!     .with_max_branches(4096)
//!     .with_max_symbols(1 << 20);
//! ```

/// Configuration for forest behavior and resource limits.
///
/// # Default Values
///
/// | Setting | Default | Rationale |
/// |---------|---------|-----------|
/// | `max_recursion_depth` | `usize::MAX` | No limit by default; counts frames per branch |
/// | `max_branches` | `usize::MAX` | No limit by default |
/// | `max_symbols` | `usize::MAX` | No limit by default |
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
    /// Maximum number of frames a single branch may hold.
    ///
    /// Every open sequence, repetition or emission on a branch takes one
    /// frame. Sequences tail-call their last element, so right-recursive
    /// lists do not count against this limit.
    ///
    /// Default: `usize::MAX` (no limit)
    pub max_recursion_depth: usize,

    /// Maximum number of live branches after any single symbol.
    ///
    /// Default: `usize::MAX` (no limit)
    pub max_branches: usize,

    /// Maximum number of symbols a forest will accept.
    ///
    /// Default: `usize::MAX` (no limit)
    pub max_symbols: usize,
}

impl Default for ParseConfig {
    /// Returns the default configuration.
    ///
    /// - `max_recursion_depth`: `usize::MAX`
    /// - `max_branches`: `usize::MAX`
    /// - `max_symbols`: `usize::MAX`
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl ParseConfig {
    /// Default configuration, usable in const contexts.
    pub const DEFAULT: Self = Self {
        max_recursion_depth: usize::MAX,
        max_branches: usize::MAX,
        max_symbols: usize::MAX,
    };

    /// Creates a new configuration with default values.
    #[inline]
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    /// Sets the maximum frame depth of a branch.
    ///
    /// # Arguments
    ///
    /// * `depth` - Maximum frames. Use `usize::MAX` to disable the limit.
    #[inline]
    pub const fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    /// Sets the maximum number of live branches.
    #[inline]
    pub const fn with_max_branches(mut self, count: usize) -> Self {
        self.max_branches = count;
        self
    }

    /// Sets the maximum number of symbols.
    #[inline]
    pub const fn with_max_symbols(mut self, count: usize) -> Self {
        self.max_symbols = count;
        self
    }

    /// Removes a previously set recursion limit.
    ///
    /// Deeply nested input then grows branch stacks until memory runs out.
    #[inline]
    pub const fn disable_recursion_limit(self) -> Self {
        self.with_max_recursion_depth(usize::MAX)
    }
}
