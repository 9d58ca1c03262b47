//! Incremental, ambiguity-aware grammar combinators.
//!
//! A grammar is described once with the factories in [`grammar::expr`] and
//! frozen by a [`GrammarBuilder`]. Parsing then happens one symbol at a time
//! against a caller-owned [`Forest`] holding every live candidate derivation:
//!
//! ```ignore
//! use std::sync::Arc;
//! use thicket::{Forest, GrammarBuilder, grammar::expr::*};
//!
//! let word = terminal_not([' ']).many().emit_with(|s: &[char]| s.iter().collect::<String>());
//! let grammar = GrammarBuilder::new().build(word.clone() + terminal_any([' ']) + word)?;
//!
//! let mut forest = Forest::new(Arc::new(grammar));
//! forest.feed_all("hello world".chars())?;
//! assert_eq!(forest.finish()?, ["hello", "world"]);
//! ```
//!
//! Parsing is fail-closed: when more than one derivation matches the input,
//! [`Forest::finish`] reports [`Rejection::Ambiguous`] rather than choosing.

mod branch;
pub mod config;
mod error;
mod finalise;
mod forest;
pub mod grammar;
mod step;

#[cfg(any(feature = "tokio", feature = "futures"))]
pub mod async_stream;

pub use branch::Branch;
pub use config::ParseConfig;
pub use error::{Error, Rejection};
pub use finalise::finalise;
pub use forest::{Forest, parse};
pub use grammar::{Emission, Expr, Grammar, GrammarBuilder, Hook, Node, NodeId, Rule, RuleId};
