//! The CSV grammar.

use thicket::grammar::expr::*;
use thicket::{Error, Grammar, GrammarBuilder};

#[derive(Debug, Clone, PartialEq)]
pub enum CsvToken {
    Cell(String),
    /// The cells of one record, folded together once the record ends.
    Row(Vec<String>),
}

/// Delimiter and quote characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: char,
    pub quote: char,
}

impl Dialect {
    pub const fn new(delimiter: char) -> Self {
        Self {
            delimiter,
            quote: '"',
        }
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::new(',')
    }
}

/// Builds the grammar for `dialect`:
///
/// ```text
/// file   = record*
/// record = cell (delimiter cell)* ("\n" | "\r\n")
/// cell   = bare | quoted
/// ```
pub fn csv_grammar(dialect: Dialect) -> Result<Grammar<char, CsvToken>, Error> {
    let Dialect { delimiter, quote } = dialect;
    let mut builder = GrammarBuilder::new();

    // A bare cell may not start with a quote; the barrier keeps the quoted
    // alternative from being shadowed.
    let bare = barrier_not([quote]) + terminal_not([delimiter, quote, '\r', '\n']).many();
    let quoted = terminal_any([quote])
        + (terminal_not([quote]) | terminal([quote, quote])).many()
        + terminal_any([quote]);
    let cell = builder.rule(
        "cell",
        (bare | quoted).emit_with(move |symbols: &[char]| CsvToken::Cell(unquote(symbols, quote))),
    )?;

    let line_end = terminal_any(['\n']) | terminal(['\r', '\n']);
    let record = builder.rule(
        "record",
        (reference(cell) + (terminal_any([delimiter]) + reference(cell)).many()).capture(fold_row)
            + line_end,
    )?;

    builder.build(reference(record).many())
}

fn unquote(symbols: &[char], quote: char) -> String {
    match symbols {
        [open, inner @ .., close] if *open == quote && *close == quote => {
            let mut cell = String::with_capacity(inner.len());
            let mut escaped = false;
            for &c in inner {
                // Every quote inside a quoted cell is doubled
                if c == quote && !escaped {
                    escaped = true;
                    continue;
                }
                escaped = false;
                cell.push(c);
            }
            cell
        }
        bare => bare.iter().collect(),
    }
}

fn fold_row(tokens: Vec<CsvToken>) -> CsvToken {
    let cells = tokens
        .into_iter()
        .filter_map(|token| match token {
            CsvToken::Cell(cell) => Some(cell),
            CsvToken::Row(_) => None,
        })
        .collect();
    CsvToken::Row(cells)
}
