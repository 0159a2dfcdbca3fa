//! In-memory tables. `RawTable` is the untyped row-major input; `Frame` is the
//! typed columnar representation every later stage works on.

pub mod csv;

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single raw cell as it arrived from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Number(f64),
    Text(String),
}

impl RawValue {
    /// `Null` or a NaN number.
    pub fn is_null(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Number(n) => n.is_nan(),
            RawValue::Text(_) => false,
        }
    }

    /// Finite numeric view of the cell. Text is parsed after trimming;
    /// anything that does not parse (blank text, `inf`) is `None`.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            RawValue::Null => None,
            RawValue::Number(n) => Some(*n).filter(|n| n.is_finite()),
            RawValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    /// Categorical view of the cell.
    pub fn to_category(&self) -> Option<String> {
        match self {
            RawValue::Null => None,
            RawValue::Number(n) if n.is_nan() => None,
            RawValue::Number(n) => Some(n.to_string()),
            RawValue::Text(s) => Some(s.clone()),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => Ok(()),
            RawValue::Number(n) => write!(f, "{}", n),
            RawValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Number(v as f64)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Text(v)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(RawValue::Null)
    }
}

/// Row-major raw input table. Never mutated by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<RawValue>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<RawValue>>) -> Self {
        Self { columns, rows }
    }

    /// Convenience constructor for literal tables.
    pub fn from_rows(columns: &[&str], rows: Vec<Vec<RawValue>>) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Every row must have exactly one value per column.
    pub fn validate_shape(&self) -> Result<(), SchemaError> {
        let expected = self.columns.len();
        for (row, values) in self.rows.iter().enumerate() {
            if values.len() != expected {
                return Err(SchemaError::RaggedRow {
                    row,
                    expected,
                    found: values.len(),
                });
            }
        }
        Ok(())
    }
}

/// Declared column dtype, checked at every stage boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    /// Continuous floating point
    Numeric,
    /// Small integer scale (flags and risk levels)
    Ordinal,
    /// String category; `None` marks a missing category
    Categorical,
}

impl DType {
    pub fn is_numeric(self) -> bool {
        matches!(self, DType::Numeric | DType::Ordinal)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DType::Numeric => "numeric",
            DType::Ordinal => "ordinal",
            DType::Categorical => "categorical",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Numeric(Vec<f64>),
    Ordinal(Vec<i64>),
    Categorical(Vec<Option<String>>),
}

impl ColumnValues {
    pub fn dtype(&self) -> DType {
        match self {
            ColumnValues::Numeric(_) => DType::Numeric,
            ColumnValues::Ordinal(_) => DType::Ordinal,
            ColumnValues::Categorical(_) => DType::Categorical,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Ordinal(v) => v.len(),
            ColumnValues::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `row` as f64, for numeric and ordinal columns.
    pub fn number_at(&self, row: usize) -> Option<f64> {
        match self {
            ColumnValues::Numeric(v) => v.get(row).copied(),
            ColumnValues::Ordinal(v) => v.get(row).map(|x| *x as f64),
            ColumnValues::Categorical(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Numeric(values),
        }
    }

    pub fn ordinal(name: impl Into<String>, values: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Ordinal(values),
        }
    }

    pub fn categorical(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Categorical(values),
        }
    }

    pub fn dtype(&self) -> DType {
        self.values.dtype()
    }

    fn mismatch(&self, expected: &str) -> SchemaError {
        SchemaError::DtypeMismatch {
            column: self.name.clone(),
            expected: expected.to_string(),
            found: self.dtype().to_string(),
        }
    }

    /// Borrow as a float column; ordinal columns are rejected.
    pub fn as_numeric(&self) -> Result<&[f64], SchemaError> {
        match &self.values {
            ColumnValues::Numeric(v) => Ok(v),
            _ => Err(self.mismatch("numeric")),
        }
    }

    pub fn as_categorical(&self) -> Result<&[Option<String>], SchemaError> {
        match &self.values {
            ColumnValues::Categorical(v) => Ok(v),
            _ => Err(self.mismatch("categorical")),
        }
    }
}

/// Typed columnar table with a fixed row count.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    columns: Vec<Column>,
    len: usize,
}

impl Frame {
    pub fn new(len: usize) -> Self {
        Self {
            columns: Vec::new(),
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Insert a column, replacing any existing column of the same name in
    /// place so column order stays stable.
    pub fn upsert(&mut self, column: Column) {
        debug_assert_eq!(column.values.len(), self.len, "column length mismatch");
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }
}
