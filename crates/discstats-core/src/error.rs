use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Table has no columns")]
    NoColumns,

    #[error("Column name must not be empty")]
    EmptyColumnName,

    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Column {column} has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Unsupported type {data_type} for column {column}")]
    UnsupportedType { column: String, data_type: String },

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),
}

pub type Result<T> = std::result::Result<T, TableError>;
