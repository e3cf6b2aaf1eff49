//! Delimited text parsing and loading for the visualisation pipeline

pub mod config;
pub mod parser;
pub mod sources;

use tokio::task::JoinError;
use thiserror::Error;

// Re-exports
pub use config::{ParseOptions, QuoteStrategy, RowValidation};
pub use parser::{parse_text, DelimitedParser};
pub use sources::TextSource;

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("Invalid delimiter {0:?}")]
    InvalidDelimiter(String),

    #[error("Column {0:?} appears more than once in the header")]
    DuplicateColumn(String),

    #[error("Row on line {line} has {found} fields, header has {expected}")]
    RowLength {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Join error: {0}")]
    Join(#[from] JoinError),
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => DataError::Io(std::io::Error::new(io_err.kind(), error.to_string())),
            csv::ErrorKind::UnequalLengths { pos, expected_len, len } => DataError::RowLength {
                line: pos.as_ref().map(|p| p.line()).unwrap_or(0),
                expected: *expected_len as usize,
                found: *len as usize,
            },
            _ => DataError::Csv(error.to_string()),
        }
    }
}
