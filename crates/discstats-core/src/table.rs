//! Table domain model
//!
//! A cleaned scorecard export held in memory: ordered, named, typed columns
//! that all share one row count.

use std::collections::HashSet;
use std::fmt;

use crate::{Result, TableError};

/// Typed cell storage for one column. Every cell is nullable.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    Utf8(Vec<Option<String>>),
    Boolean(Vec<Option<bool>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int64(values) => values.len(),
            ColumnData::Float64(values) => values.len(),
            ColumnData::Utf8(values) => values.len(),
            ColumnData::Boolean(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnData::Int64(_) => "int64",
            ColumnData::Float64(_) => "float64",
            ColumnData::Utf8(_) => "utf8",
            ColumnData::Boolean(_) => "boolean",
        }
    }

    /// Cell at `index`, `Value::Null` when absent or out of range
    pub fn value(&self, index: usize) -> Value<'_> {
        match self {
            ColumnData::Int64(values) => values
                .get(index)
                .copied()
                .flatten()
                .map_or(Value::Null, Value::Int),
            ColumnData::Float64(values) => values
                .get(index)
                .copied()
                .flatten()
                .map_or(Value::Null, Value::Float),
            ColumnData::Utf8(values) => values
                .get(index)
                .and_then(|value| value.as_deref())
                .map_or(Value::Null, Value::Text),
            ColumnData::Boolean(values) => values
                .get(index)
                .copied()
                .flatten()
                .map_or(Value::Null, Value::Bool),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Borrowed view of a single cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(&'a str),
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{}", value),
            Value::Bool(value) => write!(f, "{}", value),
            Value::Text(value) => f.write_str(value),
        }
    }
}

/// Validated in-memory table. Construction goes through [`Table::new`], so a
/// `Table` value always has at least one column, unique non-empty names and
/// equal column lengths.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    num_rows: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let num_rows = columns.first().ok_or(TableError::NoColumns)?.len();

        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if column.name.is_empty() {
                return Err(TableError::EmptyColumnName);
            }
            if !seen.insert(column.name.as_str()) {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
            if column.len() != num_rows {
                return Err(TableError::LengthMismatch {
                    column: column.name.clone(),
                    expected: num_rows,
                    actual: column.len(),
                });
            }
        }

        Ok(Self { columns, num_rows })
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows, self.columns.len())
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Iterate rows in stored order, one `Value` per column
    pub fn rows(&self) -> impl Iterator<Item = Vec<Value<'_>>> + '_ {
        (0..self.num_rows).map(move |index| {
            self.columns
                .iter()
                .map(|column| column.data.value(index))
                .collect()
        })
    }
}
