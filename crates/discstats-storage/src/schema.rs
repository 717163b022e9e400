//! Catalog schema

use sqlx::SqliteConnection;

use crate::Result;

// AUTOINCREMENT keeps SQLite from handing out the id of a deleted max row again.
const CREATE_UPLOADS: &str = r#"
CREATE TABLE IF NOT EXISTS uploads (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL,
    content_hash TEXT NOT NULL UNIQUE,
    uploaded_at TEXT NOT NULL,
    num_rows INTEGER NOT NULL,
    num_cols INTEGER NOT NULL
)
"#;

/// Create the `uploads` table if it does not exist yet.
pub async fn ensure_schema(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(CREATE_UPLOADS).execute(&mut *conn).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Connection;

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();

        ensure_schema(&mut conn).await.unwrap();
        ensure_schema(&mut conn).await.unwrap();

        let columns: Vec<(i64, String, String, i64, Option<String>, i64)> =
            sqlx::query_as("PRAGMA table_info(uploads)")
                .fetch_all(&mut conn)
                .await
                .unwrap();
        let names: Vec<&str> = columns.iter().map(|(_, name, ..)| name.as_str()).collect();
        assert_eq!(
            names,
            vec!["id", "filename", "content_hash", "uploaded_at", "num_rows", "num_cols"]
        );

        let not_null: Vec<&str> = columns
            .iter()
            .filter(|(_, _, _, notnull, _, _)| *notnull == 1)
            .map(|(_, name, ..)| name.as_str())
            .collect();
        assert_eq!(not_null.len(), 5);
    }

    #[tokio::test]
    async fn test_content_hash_is_unique() {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
        ensure_schema(&mut conn).await.unwrap();

        let insert = "INSERT INTO uploads (filename, content_hash, uploaded_at, num_rows, num_cols) \
                      VALUES (?, 'abc', '2024-05-01T10:00:00.000000+00:00', 1, 1)";
        sqlx::query(insert)
            .bind("a.csv")
            .execute(&mut conn)
            .await
            .unwrap();
        let err = sqlx::query(insert)
            .bind("b.csv")
            .execute(&mut conn)
            .await
            .unwrap_err();

        match err {
            sqlx::Error::Database(db_err) => assert!(db_err.is_unique_violation()),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
