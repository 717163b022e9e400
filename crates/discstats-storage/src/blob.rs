//! Blob storage for upload artifacts
//!
//! Each catalog row owns two files under the uploads directory: the cleaned
//! table as Parquet and the original bytes verbatim. Files are written at most
//! once; a blob that already exists is never replaced.

use std::io::ErrorKind;
use std::path::Path;

use bytes::Bytes;
use discstats_core::{Table, codec};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::layout::StoreLayout;
use crate::models::UploadRecord;
use crate::{Result, StorageError};

/// Blob store for cleaned tables and original upload bytes
#[derive(Debug, Clone)]
pub struct BlobStore {
    layout: StoreLayout,
}

impl BlobStore {
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    /// Write both blobs for `record` unless they are already on disk.
    ///
    /// The table is only encoded when its blob is missing, and only if its
    /// shape is the one recorded in the catalog; otherwise
    /// [`StorageError::ShapeMismatch`] is returned and nothing is written for it.
    #[instrument(skip(self, table, raw_bytes), fields(id = record.id))]
    pub async fn persist(
        &self,
        record: &UploadRecord,
        table: &Table,
        raw_bytes: &[u8],
    ) -> Result<()> {
        let raw_path = record.raw_path(&self.layout);
        if self.write_if_absent(&raw_path, raw_bytes).await? {
            info!(path = %raw_path.display(), size = raw_bytes.len(), "raw blob written");
        }

        let table_path = record.table_path(&self.layout);
        if !tokio::fs::try_exists(&table_path).await? {
            check_shape(record, table)?;
            let encoded = codec::encode_parquet(table)?;
            if self.write_if_absent(&table_path, &encoded).await? {
                info!(path = %table_path.display(), size = encoded.len(), "table blob written");
            }
        }

        Ok(())
    }

    /// Write `data` to `path` if nothing is there yet.
    ///
    /// Returns `false` when the file already existed, including when another
    /// writer created it while this call was running.
    pub async fn write_if_absent(&self, path: &Path, data: &[u8]) -> Result<bool> {
        if tokio::fs::try_exists(path).await? {
            return Ok(false);
        }

        let parent = path.parent().ok_or_else(|| {
            StorageError::Internal(format!("blob path {} has no parent", path.display()))
        })?;
        tokio::fs::create_dir_all(parent).await?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = parent.join(format!(".{}.tmp.{}", file_name, Uuid::new_v4()));

        let written = write_then_link(&temp_path, path, data).await;

        if let Err(e) = tokio::fs::remove_file(&temp_path).await
            && e.kind() != ErrorKind::NotFound
        {
            warn!(path = %temp_path.display(), error = %e, "failed to remove temp blob");
        }

        written
    }

    pub async fn read_table(&self, record: &UploadRecord) -> Result<Table> {
        let bytes = read_blob(record.id, &record.table_path(&self.layout)).await?;
        Ok(codec::decode_parquet(Bytes::from(bytes))?)
    }

    pub async fn read_raw(&self, record: &UploadRecord) -> Result<Vec<u8>> {
        read_blob(record.id, &record.raw_path(&self.layout)).await
    }
}

// Hard-linking fails with AlreadyExists instead of replacing, so the first
// complete file stays in place when writers race.
async fn write_then_link(temp_path: &Path, path: &Path, data: &[u8]) -> Result<bool> {
    {
        let mut file = tokio::fs::File::create(temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
    }

    match tokio::fs::hard_link(temp_path, path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) if matches!(e.kind(), ErrorKind::Unsupported | ErrorKind::PermissionDenied) => {
            warn!(path = %path.display(), error = %e, "hard link failed, creating blob in place");
            write_new(path, data).await
        }
        Err(e) => Err(e.into()),
    }
}

// Exclusive create keeps first-writer-wins, but readers may observe a
// partially written file until this returns.
async fn write_new(path: &Path, data: &[u8]) -> Result<bool> {
    let opened = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await;
    let mut file = match opened {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    file.write_all(data).await?;
    file.sync_all().await?;
    Ok(true)
}

fn check_shape(record: &UploadRecord, table: &Table) -> Result<()> {
    let (actual_rows, actual_cols) = table.shape();
    let matches = i64::try_from(actual_rows).is_ok_and(|rows| rows == record.num_rows)
        && i64::try_from(actual_cols).is_ok_and(|cols| cols == record.num_cols);
    if matches {
        return Ok(());
    }
    Err(StorageError::ShapeMismatch {
        id: record.id,
        rows: record.num_rows,
        cols: record.num_cols,
        actual_rows,
        actual_cols,
    })
}

async fn read_blob(id: i64, path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            StorageError::MissingArtifact {
                id,
                path: path.to_path_buf(),
            }
        } else {
            StorageError::Io(e)
        }
    })
}
