//! Core table model for discstats
//!
//! This crate contains:
//! - The `Table` abstraction (named, typed, nullable columns)
//! - Arrow record batch conversion
//! - The Parquet codec used for persisted cleaned tables

mod batch;
pub mod codec;
pub mod error;
pub mod table;

pub use error::{Result, TableError};
pub use table::{Column, ColumnData, Table, Value};
