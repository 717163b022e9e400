use anyhow::{Context, Result};
use discstats_storage::UploadStore;
use std::path::{Path, PathBuf};

use crate::ingest;

pub async fn handle(store: &UploadStore, path: PathBuf, name: Option<String>) -> Result<()> {
    let raw = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = match name {
        Some(name) => name,
        None => file_name(&path)?,
    };
    let table = ingest::read_csv(&raw)
        .with_context(|| format!("Failed to parse {} as CSV", path.display()))?;

    let saved = store.save_upload(&filename, &raw, &table).await?;
    let record = &saved.record;

    if saved.created {
        println!("✓ Stored upload {}", record.id);
    } else {
        println!("✓ Already stored as upload {}", record.id);
    }
    println!("  {}", record.label());
    println!("  Shape: {} rows x {} columns", record.num_rows, record.num_cols);
    println!("  Hash: {}", record.content_hash);

    Ok(())
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name; pass --name", path.display()))
}
