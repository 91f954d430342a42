//! Flat rows as produced by a joined query
//!
//! A `FlatRow` owns one row's `(column, value)` pairs in select-list order.
//! Rows are ephemeral: the row source builds one, the materializer reads it,
//! and it is dropped before the next row is fetched.

use serde::Serialize;

use crate::errors::{RelmatError, Result};

/// A nullable scalar column value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Storage class name, used in mapping error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::Text(_) => "TEXT",
            Value::Blob(_) => "BLOB",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One row of a tabular result, addressable by column name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlatRow {
    columns: Vec<(String, Value)>,
}

impl FlatRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column; builder style for tests and row sources
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((column.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in select-list order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Look up a column by name
    ///
    /// Exact matches win; otherwise the first ASCII-case-insensitive match is
    /// returned, since SQL identifiers are case-insensitive. `None` means the
    /// column is not part of the row schema at all, which is different from
    /// a present column holding `Value::Null`.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(column))
            })
            .map(|(_, value)| value)
    }

    /// Look up a column that the query convention says must exist
    ///
    /// # Errors
    ///
    /// Returns `MissingColumn` if the row schema has no such column.
    pub fn require(&self, column: &str) -> Result<&Value> {
        self.get(column).ok_or_else(|| RelmatError::MissingColumn {
            column: column.to_string(),
        })
    }

    /// Read a non-null INTEGER column
    ///
    /// # Errors
    ///
    /// Returns `MissingColumn` or `ColumnType` (NULL included).
    pub fn i64(&self, column: &str) -> Result<i64> {
        match self.require(column)? {
            Value::Integer(v) => Ok(*v),
            other => Err(type_error(column, "INTEGER", other)),
        }
    }

    /// Read a nullable INTEGER column
    ///
    /// # Errors
    ///
    /// Returns `MissingColumn` or `ColumnType`.
    pub fn opt_i64(&self, column: &str) -> Result<Option<i64>> {
        match self.require(column)? {
            Value::Null => Ok(None),
            Value::Integer(v) => Ok(Some(*v)),
            other => Err(type_error(column, "INTEGER", other)),
        }
    }

    /// Read a non-null TEXT column
    ///
    /// # Errors
    ///
    /// Returns `MissingColumn` or `ColumnType` (NULL included).
    pub fn text(&self, column: &str) -> Result<String> {
        match self.require(column)? {
            Value::Text(v) => Ok(v.clone()),
            other => Err(type_error(column, "TEXT", other)),
        }
    }

    /// Read a nullable TEXT column
    ///
    /// # Errors
    ///
    /// Returns `MissingColumn` or `ColumnType`.
    pub fn opt_text(&self, column: &str) -> Result<Option<String>> {
        match self.require(column)? {
            Value::Null => Ok(None),
            Value::Text(v) => Ok(Some(v.clone())),
            other => Err(type_error(column, "TEXT", other)),
        }
    }
}

fn type_error(column: &str, expected: &'static str, found: &Value) -> RelmatError {
    RelmatError::ColumnType {
        column: column.to_string(),
        expected,
        found: found.type_name(),
    }
}

/// Named values for a single-row insert, in column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    values: Vec<(String, Value)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Set a column, replacing any earlier value for the same name
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.values.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.values.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, v)| (name.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
