//! On-disk layout of a store root
//!
//! ```text
//! <root>/app.db                  catalog
//! <root>/uploads/<id>.parquet    cleaned table
//! <root>/uploads/<id>.csv        original bytes
//! ```

use std::path::{Path, PathBuf};

use crate::Result;

const CATALOG_FILE: &str = "app.db";
const UPLOADS_DIR: &str = "uploads";

#[derive(Debug, Clone)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.root.join(CATALOG_FILE)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join(UPLOADS_DIR)
    }

    pub fn table_path(&self, id: i64) -> PathBuf {
        self.uploads_dir().join(table_file_name(id))
    }

    pub fn raw_path(&self, id: i64) -> PathBuf {
        self.uploads_dir().join(raw_file_name(id))
    }

    /// Create the catalog's parent directory and the uploads directory.
    pub async fn ensure_locations(&self) -> Result<()> {
        if let Some(parent) = self.catalog_path().parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::create_dir_all(self.uploads_dir()).await?;
        Ok(())
    }
}

pub(crate) fn table_file_name(id: i64) -> String {
    format!("{}.parquet", id)
}

pub(crate) fn raw_file_name(id: i64) -> String {
    format!("{}.csv", id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_follow_root() {
        let layout = StoreLayout::new("/srv/discstats");
        assert_eq!(layout.catalog_path(), PathBuf::from("/srv/discstats/app.db"));
        assert_eq!(layout.uploads_dir(), PathBuf::from("/srv/discstats/uploads"));
        assert_eq!(
            layout.table_path(12),
            PathBuf::from("/srv/discstats/uploads/12.parquet")
        );
        assert_eq!(layout.raw_path(12), PathBuf::from("/srv/discstats/uploads/12.csv"));
    }

    #[tokio::test]
    async fn test_ensure_locations_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path().join("nested").join("data"));

        layout.ensure_locations().await.unwrap();
        layout.ensure_locations().await.unwrap();

        assert!(layout.uploads_dir().is_dir());
        assert!(layout.catalog_path().parent().unwrap().is_dir());
    }
}
