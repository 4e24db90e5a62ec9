use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpendsortError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Column not found: {column}")]
    ColumnNotFound { column: String },

    #[error("Not a number: {0:?}")]
    NumericFormat(String),

    #[error("Missing header row (expected on line {line})")]
    MissingHeader { line: usize },

    #[error("Row {line} has no value for column {column}")]
    ShortRow { line: usize, column: usize },

    #[error("Row {line} has {found} fields, header has {expected}")]
    RowLength {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Unknown bank file format: {}", .0.display())]
    UnrecognizedBankFile(PathBuf),

    #[error("{matched} of {total} transfers matched")]
    UnmatchedTransfers { matched: usize, total: usize },

    #[error("Invalid period: {0} days")]
    InvalidPeriod(u32),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SpendsortError>;
