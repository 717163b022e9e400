//! Error types for discstats-storage

use std::path::PathBuf;

use discstats_core::TableError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid table: {0}")]
    Table(#[from] TableError),

    #[error("No upload found with id {0}")]
    NotFound(i64),

    #[error("Stored blob for upload {id} not found at {}. The upload may be corrupted.", path.display())]
    MissingArtifact { id: i64, path: PathBuf },

    #[error(
        "Table for upload {id} has {actual_rows} rows x {actual_cols} columns, \
         but the catalog records {rows} x {cols}"
    )]
    ShapeMismatch {
        id: i64,
        rows: i64,
        cols: i64,
        actual_rows: usize,
        actual_cols: usize,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    pub fn is_missing_artifact(&self) -> bool {
        matches!(self, StorageError::MissingArtifact { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_are_distinct() {
        let not_found = StorageError::NotFound(7);
        let missing = StorageError::MissingArtifact {
            id: 7,
            path: PathBuf::from("data/uploads/7.parquet"),
        };

        assert!(not_found.is_not_found());
        assert!(!not_found.is_missing_artifact());
        assert!(missing.is_missing_artifact());
        assert!(!missing.is_not_found());
        assert!(missing.to_string().contains("data/uploads/7.parquet"));
        assert_eq!(not_found.to_string(), "No upload found with id 7");
    }
}
