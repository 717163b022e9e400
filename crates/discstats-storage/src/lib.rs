//! Upload persistence for discstats
//!
//! This crate provides:
//! - The SQLite catalog of uploads (WAL journal, one connection per operation)
//! - Content hashing and deduplication of uploaded bytes
//! - Blob storage for the cleaned table (Parquet) and the original bytes

pub mod blob;
pub mod catalog;
pub mod error;
pub mod hash;
pub mod layout;
pub mod models;
pub mod schema;
pub mod store;
pub mod uploads;

pub use blob::BlobStore;
pub use catalog::{Catalog, Intent};
pub use error::{Result, StorageError};
pub use hash::content_hash;
pub use layout::StoreLayout;
pub use models::{SavedUpload, UploadRecord};
pub use store::UploadStore;
