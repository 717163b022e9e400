//! Upload store: the operations the application calls

use discstats_core::Table;
use sqlx::SqliteConnection;
use tracing::instrument;

use crate::blob::BlobStore;
use crate::catalog::{Catalog, Intent};
use crate::hash::content_hash;
use crate::layout::StoreLayout;
use crate::models::{NewUpload, SavedUpload, UploadRecord};
use crate::{Result, StorageError, schema, uploads};

/// Content-addressed store of uploaded scorecard exports
///
/// Holds no connection between calls; every operation opens, uses and
/// releases its own.
#[derive(Debug, Clone)]
pub struct UploadStore {
    layout: StoreLayout,
    catalog: Catalog,
    blobs: BlobStore,
}

impl UploadStore {
    pub fn new(layout: StoreLayout) -> Self {
        Self {
            catalog: Catalog::new(layout.clone()),
            blobs: BlobStore::new(layout.clone()),
            layout,
        }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Create storage directories and the catalog table. Safe to repeat.
    pub async fn initialize(&self) -> Result<()> {
        self.catalog
            .with_catalog(Intent::Write, |conn| Box::pin(schema::ensure_schema(conn)))
            .await
    }

    /// Store `raw_bytes` and its cleaned `table`, deduplicated by content hash.
    pub async fn save(
        &self,
        filename: &str,
        raw_bytes: &[u8],
        table: &Table,
    ) -> Result<UploadRecord> {
        Ok(self.save_upload(filename, raw_bytes, table).await?.record)
    }

    /// Like [`UploadStore::save`], also reporting whether a new row was created.
    #[instrument(skip(self, raw_bytes, table), fields(size = raw_bytes.len()))]
    pub async fn save_upload(
        &self,
        filename: &str,
        raw_bytes: &[u8],
        table: &Table,
    ) -> Result<SavedUpload> {
        let upload = NewUpload::new(filename, content_hash(raw_bytes), table)?;

        let saved = self
            .catalog
            .with_catalog(Intent::Write, move |conn| Box::pin(record_upload(conn, upload)))
            .await?;

        self.blobs.persist(&saved.record, table, raw_bytes).await?;
        Ok(saved)
    }

    /// All uploads, most recent first.
    pub async fn list(&self) -> Result<Vec<UploadRecord>> {
        self.catalog
            .with_catalog(Intent::Read, |conn| Box::pin(list_uploads(conn)))
            .await
    }

    pub async fn get(&self, id: i64) -> Result<Option<UploadRecord>> {
        self.catalog
            .with_catalog(Intent::Read, move |conn| Box::pin(lookup_upload(conn, id)))
            .await
    }

    /// The cleaned table saved for `id`.
    ///
    /// Fails with [`StorageError::NotFound`] for an unknown id and with
    /// [`StorageError::MissingArtifact`] when the row exists but its blob does not.
    #[instrument(skip(self))]
    pub async fn load(&self, id: i64) -> Result<Table> {
        let record = self.get(id).await?.ok_or(StorageError::NotFound(id))?;
        self.blobs.read_table(&record).await
    }

    /// The original bytes saved for `id`, with the same failure modes as `load`.
    #[instrument(skip(self))]
    pub async fn load_raw(&self, id: i64) -> Result<Vec<u8>> {
        let record = self.get(id).await?.ok_or(StorageError::NotFound(id))?;
        self.blobs.read_raw(&record).await
    }
}

async fn record_upload(conn: &mut SqliteConnection, upload: NewUpload) -> Result<SavedUpload> {
    schema::ensure_schema(conn).await?;
    uploads::find_or_insert(conn, upload).await
}

async fn list_uploads(conn: &mut SqliteConnection) -> Result<Vec<UploadRecord>> {
    schema::ensure_schema(conn).await?;
    uploads::list_all(conn).await
}

async fn lookup_upload(conn: &mut SqliteConnection, id: i64) -> Result<Option<UploadRecord>> {
    schema::ensure_schema(conn).await?;
    uploads::find_by_id(conn, id).await
}
