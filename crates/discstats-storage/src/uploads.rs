//! Queries against the `uploads` table
//!
//! All functions run on a borrowed connection so that the caller decides the
//! transaction boundary (see [`crate::catalog::Catalog::with_catalog`]).

use sqlx::SqliteConnection;
use tracing::{info, instrument, warn};

use crate::models::{self, NewUpload, SavedUpload, UploadRecord};
use crate::{Result, StorageError};

const SELECT_UPLOADS: &str =
    "SELECT id, filename, content_hash, uploaded_at, num_rows, num_cols FROM uploads";

pub async fn find_by_hash(
    conn: &mut SqliteConnection,
    content_hash: &str,
) -> Result<Option<UploadRecord>> {
    let record = sqlx::query_as::<_, UploadRecord>(&format!(
        "{} WHERE content_hash = ?",
        SELECT_UPLOADS
    ))
    .bind(content_hash)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(record)
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<UploadRecord>> {
    let record = sqlx::query_as::<_, UploadRecord>(&format!("{} WHERE id = ?", SELECT_UPLOADS))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(record)
}

/// Most recent first; `uploaded_at` is fixed-width so text order is time order.
pub async fn list_all(conn: &mut SqliteConnection) -> Result<Vec<UploadRecord>> {
    let records = sqlx::query_as::<_, UploadRecord>(&format!(
        "{} ORDER BY uploaded_at DESC, id DESC",
        SELECT_UPLOADS
    ))
    .fetch_all(&mut *conn)
    .await?;
    Ok(records)
}

/// Return the row for `upload.content_hash`, inserting it first if absent.
///
/// An existing row always wins: the filename, timestamp and shape carried by
/// `upload` are discarded in that case.
#[instrument(skip(conn, upload), fields(content_hash = %upload.content_hash))]
pub(crate) async fn find_or_insert(
    conn: &mut SqliteConnection,
    upload: NewUpload,
) -> Result<SavedUpload> {
    if let Some(record) = find_by_hash(conn, &upload.content_hash).await? {
        info!(id = record.id, "content already stored");
        return Ok(SavedUpload {
            record,
            created: false,
        });
    }
    insert_or_reread(conn, upload).await
}

/// Insert `upload`; if another writer got the same hash in first, re-read
/// and return its row instead of failing.
///
/// `uploaded_at` is taken here, inside the caller's write transaction, so
/// timestamp order follows id order.
pub(crate) async fn insert_or_reread(
    conn: &mut SqliteConnection,
    upload: NewUpload,
) -> Result<SavedUpload> {
    let uploaded_at = models::uploaded_now()?;
    let inserted = sqlx::query(
        "INSERT INTO uploads (filename, content_hash, uploaded_at, num_rows, num_cols) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&upload.filename)
    .bind(&upload.content_hash)
    .bind(&uploaded_at)
    .bind(upload.num_rows)
    .bind(upload.num_cols)
    .execute(&mut *conn)
    .await;

    match inserted {
        Ok(result) => {
            let record = upload.into_record(result.last_insert_rowid(), uploaded_at);
            info!(id = record.id, filename = %record.filename, "upload recorded");
            Ok(SavedUpload {
                record,
                created: true,
            })
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            warn!(
                content_hash = %upload.content_hash,
                "concurrent insert won the race, re-reading stored upload"
            );
            let record = find_by_hash(conn, &upload.content_hash)
                .await?
                .ok_or_else(|| {
                    StorageError::Internal(format!(
                        "upload {} missing after unique constraint conflict",
                        upload.content_hash
                    ))
                })?;
            Ok(SavedUpload {
                record,
                created: false,
            })
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ensure_schema;
    use sqlx::Connection;

    fn upload(filename: &str, hash: &str, rows: i64) -> NewUpload {
        NewUpload {
            filename: filename.to_string(),
            content_hash: hash.to_string(),
            num_rows: rows,
            num_cols: 4,
        }
    }

    async fn memory_catalog() -> SqliteConnection {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
        ensure_schema(&mut conn).await.unwrap();
        conn
    }

    #[tokio::test]
    async fn test_find_or_insert_first_write_wins() {
        let mut conn = memory_catalog().await;

        let first = find_or_insert(&mut conn, upload("a.csv", "h1", 10))
            .await
            .unwrap();
        assert!(first.created);

        let second = find_or_insert(&mut conn, upload("b.csv", "h1", 99))
            .await
            .unwrap();
        assert!(!second.created);
        assert_eq!(second.record, first.record);
        assert_eq!(second.record.filename, "a.csv");
        assert_eq!(second.record.num_rows, 10);
    }

    #[tokio::test]
    async fn test_insert_conflict_rereads_existing_row() {
        let mut conn = memory_catalog().await;
        let winner = insert_or_reread(&mut conn, upload("winner.csv", "h2", 5))
            .await
            .unwrap();

        // Skips the lookup, as a writer that lost the race would.
        let loser = insert_or_reread(&mut conn, upload("loser.csv", "h2", 6))
            .await
            .unwrap();

        assert!(!loser.created);
        assert_eq!(loser.record, winner.record);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM uploads")
            .fetch_one(&mut conn)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_list_all_most_recent_first() {
        let mut conn = memory_catalog().await;
        for (name, hash, at) in [
            ("old.csv", "h1", "2024-01-01T09:00:00.000000+00:00"),
            ("new.csv", "h2", "2024-03-01T09:00:00.000000+00:00"),
            ("mid.csv", "h3", "2024-02-01T09:00:00.000000+00:00"),
            ("tie.csv", "h4", "2024-03-01T09:00:00.000000+00:00"),
        ] {
            sqlx::query(
                "INSERT INTO uploads (filename, content_hash, uploaded_at, num_rows, num_cols) \
                 VALUES (?, ?, ?, 1, 4)",
            )
            .bind(name)
            .bind(hash)
            .bind(at)
            .execute(&mut conn)
            .await
            .unwrap();
        }

        let names: Vec<String> = list_all(&mut conn)
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.filename)
            .collect();
        assert_eq!(names, vec!["tie.csv", "new.csv", "mid.csv", "old.csv"]);
    }

    #[tokio::test]
    async fn test_insert_timestamps_follow_insert_order() {
        let mut conn = memory_catalog().await;

        let mut records = Vec::new();
        for hash in ["h1", "h2", "h3", "h4"] {
            let saved = insert_or_reread(&mut conn, upload("r.csv", hash, 1))
                .await
                .unwrap();
            assert_eq!(saved.record.uploaded_at.len(), 32);
            records.push(saved.record);
        }

        assert!(
            records
                .windows(2)
                .all(|pair| pair[0].id < pair[1].id && pair[0].uploaded_at <= pair[1].uploaded_at)
        );
    }

    #[tokio::test]
    async fn test_find_by_id_absent() {
        let mut conn = memory_catalog().await;
        assert!(find_by_id(&mut conn, 42).await.unwrap().is_none());
    }
}
