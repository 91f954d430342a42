//! Row sources over SQLite statements
//!
//! `SqliteRowSource` adapts a running `rusqlite` query into the blocking,
//! forward-only `Iterator<Item = Result<FlatRow>>` that the materializer
//! consumes. Each row is copied out of the cursor into an owned `FlatRow`
//! before the next step, so nothing borrowed from SQLite escapes an
//! iteration.

use relmat_core::{FlatRow, RelmatError, Value};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, Row, Rows, Statement};

use crate::errors::{from_rusqlite, relmat_from_rusqlite, Result};

/// Forward-only cursor yielding owned rows
pub struct SqliteRowSource<'stmt> {
    rows: Rows<'stmt>,
    columns: Vec<String>,
    done: bool,
}

impl<'stmt> SqliteRowSource<'stmt> {
    /// Start the statement with positional parameters
    ///
    /// # Errors
    ///
    /// Binding failures (wrong parameter count) as `Persistence`.
    pub fn new(stmt: &'stmt mut Statement<'_>, params: &[Value]) -> Result<Self> {
        let columns = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let rows = stmt
            .query(params_from_iter(params.iter().map(to_sql_value)))
            .map_err(from_rusqlite)?;
        Ok(Self {
            rows,
            columns,
            done: false,
        })
    }

    /// Column names in select-list order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl Iterator for SqliteRowSource<'_> {
    type Item = relmat_core::Result<FlatRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.rows.next() {
            Ok(Some(row)) => Some(flat_row(row, &self.columns)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                // A failed step ends the cursor
                self.done = true;
                Some(Err(relmat_from_rusqlite(e)))
            }
        }
    }
}

/// Prepare `sql`, run it with `params` and hand the row source to `f`
///
/// The statement lives for the duration of the call only.
///
/// # Errors
///
/// Preparation and binding failures, then whatever `f` returns.
pub fn with_row_source<T, F>(conn: &Connection, sql: &str, params: &[Value], f: F) -> Result<T>
where
    F: FnOnce(SqliteRowSource<'_>) -> relmat_core::Result<T>,
{
    let mut stmt = conn.prepare(sql).map_err(from_rusqlite)?;
    let source = SqliteRowSource::new(&mut stmt, params)?;
    Ok(f(source)?)
}

/// Run a query and collect every row
///
/// # Errors
///
/// Preparation, binding and step failures.
pub fn query_rows(conn: &Connection, sql: &str, params: &[Value]) -> Result<Vec<FlatRow>> {
    with_row_source(conn, sql, params, |rows| rows.collect())
}

/// Convert a column value into an owned SQLite parameter
pub fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(v) => SqlValue::Integer(*v),
        Value::Real(v) => SqlValue::Real(*v),
        Value::Text(v) => SqlValue::Text(v.clone()),
        Value::Blob(v) => SqlValue::Blob(v.clone()),
    }
}

fn flat_row(row: &Row<'_>, columns: &[String]) -> relmat_core::Result<FlatRow> {
    let mut flat = FlatRow::new();
    for (idx, name) in columns.iter().enumerate() {
        let value = match row.get_ref(idx).map_err(relmat_from_rusqlite)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) => Value::Integer(v),
            ValueRef::Real(v) => Value::Real(v),
            ValueRef::Text(bytes) => Value::Text(
                String::from_utf8(bytes.to_vec()).map_err(|e| RelmatError::Persistence {
                    message: format!("column {} is not valid UTF-8: {}", name, e),
                })?,
            ),
            ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
        };
        flat.push(name.as_str(), value);
    }
    Ok(flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relmat_core::ExErrorKind;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, label TEXT, score REAL, raw BLOB);
             INSERT INTO t VALUES (1, 'a', 1.5, x'ff00');
             INSERT INTO t VALUES (2, NULL, NULL, NULL);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_rows_carry_every_storage_class() {
        let rows = query_rows(&conn(), "SELECT id, label, score, raw FROM t ORDER BY id", &[])
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("label"), Some(&Value::Text("a".to_string())));
        assert_eq!(rows[0].get("score"), Some(&Value::Real(1.5)));
        assert_eq!(rows[0].get("raw"), Some(&Value::Blob(vec![0xff, 0x00])));
        assert_eq!(rows[1].get("label"), Some(&Value::Null));
    }

    #[test]
    fn test_aliases_become_column_names() {
        let rows = query_rows(
            &conn(),
            "SELECT id AS cid, label AS l FROM t WHERE id = ?1",
            &[Value::Integer(1)],
        )
        .unwrap();
        let names: Vec<&str> = rows[0].column_names().collect();
        assert_eq!(names, vec!["cid", "l"]);
    }

    #[test]
    fn test_bad_sql_is_persistence_error() {
        let err = query_rows(&conn(), "SELECT nope FROM t", &[]).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Persistence);
    }

    #[test]
    fn test_source_is_fused_after_end() {
        let conn = conn();
        let mut stmt = conn.prepare("SELECT id FROM t").unwrap();
        let mut source = SqliteRowSource::new(&mut stmt, &[]).unwrap();
        assert_eq!(source.columns(), ["id".to_string()]);
        assert!(source.next().is_some());
        assert!(source.next().is_some());
        assert!(source.next().is_none());
        assert!(source.next().is_none());
    }
}
