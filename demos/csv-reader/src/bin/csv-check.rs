//! Validates CSV on stdin.
//!
//! ```text
//! csv-check [DELIMITER] < data.csv
//! ```
//!
//! Prints the record count, or the first error. Set `RUST_LOG=debug` to see
//! the engine's verdicts.

use std::io::BufRead;
use std::process::ExitCode;

use csv_reader::{CsvError, CsvReader, Dialect};

fn main() -> ExitCode {
    pretty_env_logger::init();

    let dialect = match std::env::args().nth(1) {
        Some(arg) => match arg.chars().collect::<Vec<_>>().as_slice() {
            [delimiter] => Dialect::new(*delimiter),
            _ => {
                eprintln!("delimiter must be a single character, got {arg:?}");
                return ExitCode::from(2);
            }
        },
        None => Dialect::default(),
    };

    match check(dialect) {
        Ok(count) => {
            println!("{count} records");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn check(dialect: Dialect) -> Result<usize, CheckError> {
    let mut reader = CsvReader::new(dialect)?;
    let mut stdin = std::io::stdin().lock();
    let mut line = String::new();
    loop {
        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        reader.feed(&line)?;
        log::trace!("{} characters accepted", reader.consumed());
    }
    Ok(reader.finish()?.len())
}

#[derive(thiserror::Error, Debug)]
enum CheckError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] CsvError),
}
