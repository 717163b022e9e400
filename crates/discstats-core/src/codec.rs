//! Parquet codec for cleaned tables
//!
//! This is the on-disk format of the cleaned-table blob. The Arrow schema is
//! embedded in the file metadata, so column names, types and nullability come
//! back exactly as written, including for tables with zero rows.

use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::Result;
use crate::table::Table;

pub fn encode_parquet(table: &Table) -> Result<Vec<u8>> {
    let batch = table.to_record_batch()?;
    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(buffer)
}

pub fn decode_parquet(bytes: Bytes) -> Result<Table> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes)?;
    let schema = builder.schema().clone();
    let batches = builder
        .build()?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Table::from_record_batches(&schema, &batches)
}
