#![deny(
    unsafe_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

//! Stack Language Front End
//!
//! The front end of a small concatenative language. A `logos` lexer splits
//! source text into [`Word`]s, and each word is fed as one symbol to a
//! thicket grammar that emits [`Instruction`]s. Bracketed quotations become a
//! single [`Instruction::Quote`].
//!
//! ```text
//! 3 [ dup * ] call .   # prints 9
//! ```
//!
//! Only the instruction list is produced; running it is left to a
//! separate machine.

pub mod grammar;
pub mod lexer;

use core::ops::Range;
use std::sync::Arc;

use logos::Logos;
use thicket::{Forest, Grammar, Rejection};
use thiserror::Error;

pub use grammar::{Instruction, program_grammar};
pub use lexer::{LexError, Word};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StackError {
    #[error("{source} at {span:?}")]
    Lex {
        #[source]
        source: LexError,
        span: Range<usize>,
    },

    /// The word cannot continue any program.
    #[error("unexpected `{word}` at {span:?}")]
    Unexpected { word: String, span: Range<usize> },

    #[error("incomplete program: {0}")]
    Incomplete(#[from] Rejection),

    #[error(transparent)]
    Engine(#[from] thicket::Error),
}

/// Compiles source text to instructions, reusing one grammar.
#[derive(Debug, Clone)]
pub struct Compiler {
    grammar: Arc<Grammar<Word, Instruction>>,
}

impl Compiler {
    pub fn new() -> Result<Self, StackError> {
        Ok(Self {
            grammar: Arc::new(program_grammar()?),
        })
    }

    pub fn compile(&self, source: &str) -> Result<Vec<Instruction>, StackError> {
        let mut forest = Forest::new(Arc::clone(&self.grammar));
        let mut lexer = Word::lexer(source);
        while let Some(word) = lexer.next() {
            let word = word.map_err(|source| StackError::Lex {
                source,
                span: lexer.span(),
            })?;
            forest.feed(word)?;
            if forest.is_dead() {
                return Err(StackError::Unexpected {
                    word: lexer.slice().to_owned(),
                    span: lexer.span(),
                });
            }
        }
        let instructions = forest.finish()?;
        log::debug!(
            "compiled {} words into {} instructions",
            forest.consumed(),
            instructions.len()
        );
        Ok(instructions)
    }
}

/// Compiles `source` with a freshly built grammar.
pub fn compile(source: &str) -> Result<Vec<Instruction>, StackError> {
    Compiler::new()?.compile(source)
}
