//! Identity key extraction
//!
//! Decides entity sameness across rows. The materializer asks this module
//! two questions per row: "which parent is this?" and "is there a child on
//! this row, and which one?". A null key column answers the second question
//! with "no child"; it is an expected outcome of a left join, not an error.

use std::fmt;

use serde::Serialize;

use crate::errors::{RelmatError, Result};
use crate::row::{FlatRow, Value};

/// Comparable key value that determines entity sameness across rows
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum Identity {
    Integer(i64),
    Text(String),
    Blob(Vec<u8>),
}

impl Identity {
    /// Integer value, if this is an integer key
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Identity::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert back into a column value, e.g. for a `WHERE id = ?` parameter
    pub fn to_value(&self) -> Value {
        match self {
            Identity::Integer(v) => Value::Integer(*v),
            Identity::Text(v) => Value::Text(v.clone()),
            Identity::Blob(v) => Value::Blob(v.clone()),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Integer(v) => write!(f, "{}", v),
            Identity::Text(v) => f.write_str(v),
            Identity::Blob(v) => {
                for b in v {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }
    }
}

impl From<i64> for Identity {
    fn from(v: i64) -> Self {
        Identity::Integer(v)
    }
}

impl From<i32> for Identity {
    fn from(v: i32) -> Self {
        Identity::Integer(i64::from(v))
    }
}

impl From<&str> for Identity {
    fn from(v: &str) -> Self {
        Identity::Text(v.to_string())
    }
}

/// What to do when the key column is not in the row schema at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Absence {
    /// The query is expected to project the column; its absence is a
    /// caller/query mismatch
    #[default]
    Error,
    /// The row source may omit the column (e.g. parent-only projections);
    /// absence reads as NullIdentity
    TreatAsNull,
}

/// A declared identity column, e.g. `cid` or `orders_id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityKey {
    column: String,
    absence: Absence,
}

impl IdentityKey {
    /// Key column that must be present in every row
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            absence: Absence::Error,
        }
    }

    /// Key column whose absence from the row schema means "no entity"
    pub fn lenient(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            absence: Absence::TreatAsNull,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Extract the identity from a row
    ///
    /// `Ok(None)` is NullIdentity: the column is null (or absent under
    /// `Absence::TreatAsNull`).
    ///
    /// # Errors
    ///
    /// - `MissingColumn` when the column is absent under `Absence::Error`
    /// - `UnsupportedIdentity` when the column holds a REAL
    pub fn extract(&self, row: &FlatRow) -> Result<Option<Identity>> {
        let value = match (row.get(&self.column), self.absence) {
            (Some(value), _) => value,
            (None, Absence::TreatAsNull) => return Ok(None),
            (None, Absence::Error) => {
                return Err(RelmatError::MissingColumn {
                    column: self.column.clone(),
                })
            }
        };

        match value {
            Value::Null => Ok(None),
            Value::Integer(v) => Ok(Some(Identity::Integer(*v))),
            Value::Text(v) => Ok(Some(Identity::Text(v.clone()))),
            Value::Blob(v) => Ok(Some(Identity::Blob(v.clone()))),
            Value::Real(_) => Err(RelmatError::UnsupportedIdentity {
                column: self.column.clone(),
                found: value.type_name(),
            }),
        }
    }
}
