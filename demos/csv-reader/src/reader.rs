//! Batch, streaming and channel-driven reading.

use std::sync::Arc;

use thicket::async_stream::tokio_impl::ChannelParser;
use thicket::{Forest, Grammar};
use tokio::sync::mpsc;

use crate::grammar::{CsvToken, Dialect, csv_grammar};
use crate::{CsvError, Record};

/// Reads a whole document with the default dialect.
pub fn read_records(input: &str) -> Result<Vec<Record>, CsvError> {
    let mut reader = CsvReader::new(Dialect::default())?;
    reader.feed(input)?;
    reader.finish()
}

/// A push-based reader: feed chunks as they arrive, then finish.
///
/// Input that no record can continue with is reported by the `feed` call
/// that delivers it, without waiting for the end of the document.
#[derive(Debug)]
pub struct CsvReader {
    forest: Forest<char, CsvToken>,
    last: Option<char>,
}

impl CsvReader {
    pub fn new(dialect: Dialect) -> Result<Self, CsvError> {
        Ok(Self::with_grammar(Arc::new(csv_grammar(dialect)?)))
    }

    /// A reader sharing an already built grammar.
    pub fn with_grammar(grammar: Arc<Grammar<char, CsvToken>>) -> Self {
        Self {
            forest: Forest::new(grammar),
            last: None,
        }
    }

    pub fn feed(&mut self, chunk: &str) -> Result<(), CsvError> {
        for c in chunk.chars() {
            self.forest.feed(c)?;
            if self.forest.is_dead() {
                return Err(CsvError::Unexpected {
                    found: c,
                    offset: self.forest.consumed() - 1,
                });
            }
            self.last = Some(c);
        }
        Ok(())
    }

    /// Number of characters accepted so far.
    pub fn consumed(&self) -> usize {
        self.forest.consumed()
    }

    pub fn finish(mut self) -> Result<Vec<Record>, CsvError> {
        if !matches!(self.last, None | Some('\n')) {
            self.feed("\n")?;
        }
        let tokens = self.forest.finish()?;
        let records = into_records(tokens);
        log::debug!(
            "read {} records from {} characters",
            records.len(),
            self.forest.consumed()
        );
        Ok(records)
    }
}

/// Reads a newline-terminated document from a channel of characters.
pub async fn read_channel(
    grammar: Arc<Grammar<char, CsvToken>>,
    rx: mpsc::Receiver<char>,
) -> Result<Vec<Record>, CsvError> {
    let mut parser = ChannelParser::new(Forest::new(grammar), rx);
    parser.run().await?;
    Ok(into_records(parser.finish()?))
}

fn into_records(tokens: Vec<CsvToken>) -> Vec<Record> {
    tokens
        .into_iter()
        .filter_map(|token| match token {
            CsvToken::Row(cells) => Some(cells),
            CsvToken::Cell(_) => None,
        })
        .collect()
}
