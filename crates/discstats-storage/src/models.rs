use std::path::PathBuf;

use discstats_core::Table;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::layout::{self, StoreLayout};
use crate::{Result, StorageError};

// Fixed-width so that text order is chronological order.
const UPLOADED_AT_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]+00:00"
);

/// Catalog entry for one stored dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct UploadRecord {
    pub id: i64,
    pub filename: String,
    pub content_hash: String,
    /// ISO-8601 UTC, captured at first insert
    pub uploaded_at: String,
    pub num_rows: i64,
    pub num_cols: i64,
}

impl UploadRecord {
    pub fn table_file_name(&self) -> String {
        layout::table_file_name(self.id)
    }

    pub fn raw_file_name(&self) -> String {
        layout::raw_file_name(self.id)
    }

    pub fn table_path(&self, layout: &StoreLayout) -> PathBuf {
        layout.table_path(self.id)
    }

    pub fn raw_path(&self, layout: &StoreLayout) -> PathBuf {
        layout.raw_path(self.id)
    }

    /// `YYYY-MM-DD` part of `uploaded_at`
    pub fn uploaded_date(&self) -> &str {
        self.uploaded_at.get(..10).unwrap_or(&self.uploaded_at)
    }

    /// One-line description used when picking a saved dataset
    pub fn label(&self) -> String {
        format!(
            "ID {}: {} ({} rounds, {})",
            self.id,
            self.filename,
            self.num_rows,
            self.uploaded_date()
        )
    }
}

/// Result of a save: the resolved record and whether this call created it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedUpload {
    pub record: UploadRecord,
    pub created: bool,
}

/// Values for a catalog row that may not exist yet
///
/// Carries no timestamp: `uploaded_at` is taken at insert time, under the
/// write lock.
#[derive(Debug, Clone)]
pub(crate) struct NewUpload {
    pub filename: String,
    pub content_hash: String,
    pub num_rows: i64,
    pub num_cols: i64,
}

impl NewUpload {
    pub fn new(filename: &str, content_hash: String, table: &Table) -> Result<Self> {
        let (rows, cols) = table.shape();
        Ok(Self {
            filename: filename.to_string(),
            content_hash,
            num_rows: to_count(rows)?,
            num_cols: to_count(cols)?,
        })
    }

    pub fn into_record(self, id: i64, uploaded_at: String) -> UploadRecord {
        UploadRecord {
            id,
            filename: self.filename,
            content_hash: self.content_hash,
            uploaded_at,
            num_rows: self.num_rows,
            num_cols: self.num_cols,
        }
    }
}

/// Current UTC time in the catalog's `uploaded_at` format
pub(crate) fn uploaded_now() -> Result<String> {
    format_uploaded_at(OffsetDateTime::now_utc())
}

pub(crate) fn format_uploaded_at(at: OffsetDateTime) -> Result<String> {
    at.to_offset(time::UtcOffset::UTC)
        .format(UPLOADED_AT_FORMAT)
        .map_err(|e| StorageError::Internal(format!("Failed to format timestamp: {}", e)))
}

fn to_count(value: usize) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| StorageError::Internal(format!("Table dimension {} out of range", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use discstats_core::{Column, ColumnData};
    use time::macros::datetime;

    fn record() -> UploadRecord {
        UploadRecord {
            id: 3,
            filename: "UDisc Scorecards.csv".to_string(),
            content_hash: "ab".repeat(32),
            uploaded_at: "2024-06-02T18:04:05.000120+00:00".to_string(),
            num_rows: 41,
            num_cols: 24,
        }
    }

    #[test]
    fn test_label_and_date() {
        let record = record();
        assert_eq!(record.uploaded_date(), "2024-06-02");
        assert_eq!(
            record.label(),
            "ID 3: UDisc Scorecards.csv (41 rounds, 2024-06-02)"
        );
        assert_eq!(record.table_file_name(), "3.parquet");
        assert_eq!(record.raw_file_name(), "3.csv");
    }

    #[test]
    fn test_timestamp_is_fixed_width_utc() {
        let at = datetime!(2024-01-05 07:08:09.5 +02:00);
        assert_eq!(
            format_uploaded_at(at).unwrap(),
            "2024-01-05T05:08:09.500000+00:00"
        );
    }

    #[test]
    fn test_new_upload_takes_table_shape() {
        let table = Table::new(vec![
            Column::new("PlayerName", ColumnData::Utf8(vec![Some("Par".to_string())])),
            Column::new("Total", ColumnData::Int64(vec![Some(54)])),
        ])
        .unwrap();

        let upload = NewUpload::new("rounds.csv", "cd".repeat(32), &table).unwrap();
        assert_eq!(upload.num_rows, 1);
        assert_eq!(upload.num_cols, 2);

        let record = upload.into_record(9, uploaded_now().unwrap());
        assert_eq!(record.id, 9);
        assert_eq!(record.filename, "rounds.csv");
        assert_eq!(record.uploaded_at.len(), 32);
    }
}
