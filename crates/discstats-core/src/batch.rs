//! Conversion between `Table` and Arrow record batches

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Float64Type, Int64Type, Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};

use crate::table::{Column, ColumnData, Table};
use crate::{Result, TableError};

impl Table {
    /// Arrow schema for this table; every field is nullable
    pub fn schema(&self) -> SchemaRef {
        let fields: Vec<Field> = self
            .columns()
            .iter()
            .map(|column| Field::new(column.name(), arrow_type(column.data()), true))
            .collect();
        Arc::new(Schema::new(fields))
    }

    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let arrays: Vec<ArrayRef> = self
            .columns()
            .iter()
            .map(|column| to_array(column.data()))
            .collect();
        let options = RecordBatchOptions::new().with_row_count(Some(self.num_rows()));
        Ok(RecordBatch::try_new_with_options(
            self.schema(),
            arrays,
            &options,
        )?)
    }

    /// Concatenate `batches` (all shaped like `schema`) into one table
    pub fn from_record_batches(schema: &Schema, batches: &[RecordBatch]) -> Result<Self> {
        let mut columns = Vec::with_capacity(schema.fields().len());
        for (index, field) in schema.fields().iter().enumerate() {
            let arrays = batches.iter().map(|batch| batch.column(index));
            let data = collect_column(field, arrays)?;
            columns.push(Column::new(field.name().clone(), data));
        }
        Table::new(columns)
    }
}

fn arrow_type(data: &ColumnData) -> DataType {
    match data {
        ColumnData::Int64(_) => DataType::Int64,
        ColumnData::Float64(_) => DataType::Float64,
        ColumnData::Utf8(_) => DataType::Utf8,
        ColumnData::Boolean(_) => DataType::Boolean,
    }
}

fn to_array(data: &ColumnData) -> ArrayRef {
    match data {
        ColumnData::Int64(values) => Arc::new(Int64Array::from(values.clone())),
        ColumnData::Float64(values) => Arc::new(Float64Array::from(values.clone())),
        ColumnData::Utf8(values) => Arc::new(
            values
                .iter()
                .map(|value| value.as_deref())
                .collect::<StringArray>(),
        ),
        ColumnData::Boolean(values) => Arc::new(BooleanArray::from(values.clone())),
    }
}

fn collect_column<'a>(
    field: &Field,
    arrays: impl Iterator<Item = &'a ArrayRef>,
) -> Result<ColumnData> {
    let mut data = match field.data_type() {
        DataType::Int64 => ColumnData::Int64(Vec::new()),
        DataType::Float64 => ColumnData::Float64(Vec::new()),
        DataType::Utf8 | DataType::LargeUtf8 => ColumnData::Utf8(Vec::new()),
        DataType::Boolean => ColumnData::Boolean(Vec::new()),
        other => {
            return Err(TableError::UnsupportedType {
                column: field.name().clone(),
                data_type: other.to_string(),
            });
        }
    };

    for array in arrays {
        if array.data_type() != field.data_type() {
            return Err(TableError::Arrow(ArrowError::SchemaError(format!(
                "column {} is {} in batch but {} in schema",
                field.name(),
                array.data_type(),
                field.data_type()
            ))));
        }

        match &mut data {
            ColumnData::Int64(values) => values.extend(array.as_primitive::<Int64Type>().iter()),
            ColumnData::Float64(values) => {
                values.extend(array.as_primitive::<Float64Type>().iter())
            }
            ColumnData::Utf8(values) => {
                if let Some(strings) = array.as_string_opt::<i32>() {
                    values.extend(strings.iter().map(|value| value.map(str::to_owned)));
                } else {
                    let strings = array.as_string::<i64>();
                    values.extend(strings.iter().map(|value| value.map(str::to_owned)));
                }
            }
            ColumnData::Boolean(values) => values.extend(array.as_boolean().iter()),
        }
    }

    Ok(data)
}
