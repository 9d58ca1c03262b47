#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use csv_reader::{CsvError, CsvReader, CsvToken, Dialect, csv_grammar, read_records};
use libfuzzer_sys::fuzz_target;
use thicket::{Forest, ParseConfig};

#[derive(Debug, Arbitrary)]
struct Input {
    text: String,
    split: usize,
    config: ParseConfig,
}

fn verdict(forest: &mut Forest<char, CsvToken>, text: &str) -> Result<Vec<CsvToken>, String> {
    for c in text.chars() {
        if let Err(err) = forest.feed(c) {
            return Err(err.to_string());
        }
    }
    forest.finish().map_err(|rejection| rejection.to_string())
}

fn read_split(mut reader: CsvReader, head: &str, tail: &str) -> Result<Vec<Vec<String>>, CsvError> {
    reader.feed(head)?;
    reader.feed(tail)?;
    reader.finish()
}

fuzz_target!(|input: Input| {
    let Ok(grammar) = csv_grammar(Dialect::default()) else {
        return;
    };
    let grammar = Arc::new(grammar);

    // The engine never panics, and the same input always gets the same verdict
    let mut forest = Forest::with_config(Arc::clone(&grammar), input.config);
    let first = verdict(&mut forest, &input.text);
    forest.reset();
    let second = verdict(&mut forest, &input.text);
    assert_eq!(first, second);

    // Where a chunk boundary falls never changes the records
    let whole = read_records(&input.text);
    let mut split = input.split % (input.text.len() + 1);
    while !input.text.is_char_boundary(split) {
        split -= 1;
    }
    let (head, tail) = input.text.split_at(split);
    let chunked = read_split(CsvReader::with_grammar(grammar), head, tail);
    assert_eq!(whole, chunked);
});
