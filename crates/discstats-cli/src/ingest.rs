//! Reading scorecard exports into a [`Table`]

use std::io::Cursor;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use discstats_core::Table;

/// Records scanned when inferring column types
const INFER_RECORDS: usize = 1000;

/// Parse CSV `bytes` (with a header row) into a table.
///
/// Columns inferred as anything other than integer, float, boolean or text
/// (dates, timestamps, all-empty columns) are kept as text.
pub fn read_csv(bytes: &[u8]) -> Result<Table> {
    let format = Format::default().with_header(true);
    let (inferred, _) = format
        .infer_schema(Cursor::new(bytes), Some(INFER_RECORDS))
        .context("Failed to infer CSV column types")?;
    let schema = Arc::new(storable_schema(&inferred));

    let reader = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .build(Cursor::new(bytes))?;
    let batches = reader
        .collect::<Result<Vec<RecordBatch>, _>>()
        .context("Failed to read CSV rows")?;

    Ok(Table::from_record_batches(&schema, &batches)?)
}

fn storable_schema(inferred: &Schema) -> Schema {
    let fields: Vec<Field> = inferred
        .fields()
        .iter()
        .map(|field| {
            let data_type = match field.data_type() {
                DataType::Int64 | DataType::Float64 | DataType::Boolean | DataType::Utf8 => {
                    field.data_type().clone()
                }
                _ => DataType::Utf8,
            };
            Field::new(field.name(), data_type, true)
        })
        .collect();
    Schema::new(fields)
}
