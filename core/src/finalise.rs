//! End-of-input classification.
//!
//! Once every symbol has been fed, the surviving branches are resolved one
//! last time with no lookahead. Those that complete are counted:
//!
//! - none: [`Rejection::Syntax`]
//! - exactly one: accepted, its tokens are the result
//! - more than one distinct derivation: [`Rejection::Ambiguous`]
//!
//! Ambiguity is never resolved by picking one of the candidates.

use crate::branch::Branch;
use crate::forest::{Forest, collapse_duplicates};
use crate::step::Stepper;
use crate::{Error, Rejection};

impl<S, T> Forest<S, T>
where
    S: Clone + PartialEq,
    T: Clone,
{
    /// Classifies the forest and takes the accepted tokens.
    ///
    /// All branches are consumed; call [`reset`](Forest::reset) to reuse the
    /// forest for another parse.
    pub fn finish(&mut self) -> Result<Vec<T>, Rejection> {
        if let Some(reason) = self.aborted.take() {
            self.branches.clear();
            return Err(Rejection::Aborted { reason });
        }

        let mut complete = match self.settle_at_end() {
            Ok(complete) => complete,
            Err(reason) => {
                log::debug!("rejected: {} at end of input", reason);
                return Err(Rejection::Aborted { reason });
            }
        };

        match complete.len() {
            0 => {
                log::debug!("rejected: no complete derivation after {} symbols", self.consumed);
                Err(Rejection::Syntax {
                    consumed: self.consumed,
                })
            }
            1 => {
                let tokens = complete.pop().map(|b| b.into_tokens()).unwrap_or_default();
                log::debug!(
                    "accepted {} symbols with {} tokens",
                    self.consumed,
                    tokens.len()
                );
                Ok(tokens)
            }
            derivations => {
                log::debug!(
                    "rejected: {} derivations after {} symbols",
                    derivations,
                    self.consumed
                );
                Err(Rejection::Ambiguous {
                    derivations,
                    consumed: self.consumed,
                })
            }
        }
    }

    fn settle_at_end(&mut self) -> Result<Vec<Branch<S, T>>, Error> {
        let stepper = Stepper::new(&self.grammar, &self.config, self.consumed);
        let mut settled = Vec::with_capacity(self.branches.len());
        for branch in self.branches.drain(..) {
            stepper.settle(branch, None, &mut settled)?;
        }
        settled.retain(|branch| branch.is_complete());
        collapse_duplicates(&mut settled);
        Ok(settled)
    }
}

/// Classifies `forest` after the last symbol.
///
/// Returns `true` iff exactly one derivation completed. On success
/// `out_tokens` receives its tokens in emission order and `out_error` is
/// cleared; on failure `out_error` receives a non-empty diagnostic and
/// `out_tokens` is left untouched.
///
/// This is the boolean form of [`Forest::finish`], which reports the reason
/// as a [`Rejection`] instead.
pub fn finalise<S, T>(
    forest: &mut Forest<S, T>,
    out_tokens: Option<&mut Vec<T>>,
    out_error: Option<&mut String>,
) -> bool
where
    S: Clone + PartialEq,
    T: Clone,
{
    match forest.finish() {
        Ok(tokens) => {
            if let Some(out) = out_tokens {
                *out = tokens;
            }
            if let Some(err) = out_error {
                err.clear();
            }
            true
        }
        Err(rejection) => {
            if let Some(err) = out_error {
                *err = rejection.to_string();
            }
            false
        }
    }
}
