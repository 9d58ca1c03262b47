#![deny(
    unsafe_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

//! CSV Reader Example
//!
//! This example builds a comma/quote-aware CSV reader on thicket. Input is
//! fed one character at a time, so a document can be validated as it
//! streams in and rejected at the first character no record can continue
//! with.
//!
//! # Format
//!
//! ```text
//! name,motto
//! Alice,"fast, correct"
//! Bob,"say ""hi"""
//! ```
//!
//! - cells are separated by the dialect's delimiter (`,` by default)
//! - a quoted cell may contain delimiters, line breaks and doubled quotes
//! - records end in `\n` or `\r\n`; the final line break may be omitted

pub mod grammar;
pub mod reader;

use thiserror::Error;

pub use grammar::{CsvToken, Dialect, csv_grammar};
pub use reader::{CsvReader, read_channel, read_records};

/// One CSV record: its cells, unquoted.
pub type Record = Vec<String>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CsvError {
    /// No record can continue with the character at `offset`.
    #[error("unexpected {found:?} at character {offset}")]
    Unexpected { found: char, offset: usize },

    #[error(transparent)]
    Rejected(#[from] thicket::Rejection),

    #[error(transparent)]
    Engine(#[from] thicket::Error),
}
