use anyhow::Result;
use discstats_core::{Table, Value};
use discstats_storage::{StorageError, UploadStore};

use super::lookup_error;

pub async fn handle(store: &UploadStore, id: i64, rows: usize) -> Result<()> {
    let record = store
        .get(id)
        .await?
        .ok_or_else(|| lookup_error(StorageError::NotFound(id)))?;
    let table = store.load(id).await.map_err(lookup_error)?;

    println!("Upload {}: {}", record.id, record.filename);
    println!("  Uploaded: {}", record.uploaded_at);
    println!("  Shape: {} rows x {} columns", record.num_rows, record.num_cols);
    println!("  Hash: {}", record.content_hash);
    println!();

    for line in preview(&table, rows) {
        println!("{}", line);
    }

    Ok(())
}

/// Tab-separated header plus the first `rows` rows
fn preview(table: &Table, rows: usize) -> Vec<String> {
    let mut lines = vec![table.column_names().join("\t")];
    lines.extend(table.rows().take(rows).map(|row| {
        row.iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join("\t")
    }));

    let hidden = table.num_rows().saturating_sub(rows);
    if hidden > 0 {
        lines.push(format!("... {} more rows", hidden));
    }
    lines
}
