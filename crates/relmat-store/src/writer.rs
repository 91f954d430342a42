//! Generated-key round-trip writer
//!
//! `InsertAndFetchWriter` inserts one row, recovers the storage-assigned key
//! with `INSERT ... RETURNING`, and reads the canonical row back on the same
//! connection. It borrows a `Connection`; pass a `Transaction` (via deref)
//! to compose several writes into one all-or-nothing unit.
//!
//! ## Write unit
//!
//! ```text
//! Idle -> Inserting -> KeyObtained -> Fetching -> Committed
//!   \________\______________\____________\-----> Failed
//! ```
//!
//! `Committed` means the unit finished; durability is decided by the
//! enclosing transaction, if any.

use std::fmt;

use relmat_core::{
    log_op_end, log_op_error, log_op_start, Attributes, ExError, ExErrorKind, FlatRow, Identity,
    IdentityKey, RelmatError,
};
use rusqlite::Connection;

use crate::errors::{from_rusqlite, Result};
use crate::source::SqliteRowSource;

const INSERT_SAVEPOINT: &str = "relmat_insert";

/// Target table and its generated key column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub table: String,
    pub key_column: String,
}

impl TableSpec {
    pub fn new(table: impl Into<String>, key_column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            key_column: key_column.into(),
        }
    }

    /// Default naming convention: `Customer` maps to table `customers`, key `id`
    pub fn for_entity(entity: &str) -> Self {
        Self::new(format!("{}s", entity.to_lowercase()), "id")
    }
}

/// Quote an identifier for SQLite
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Phase of one logical write unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePhase {
    Idle,
    Inserting,
    KeyObtained,
    Fetching,
    Committed,
    Failed,
}

impl WritePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, WritePhase::Committed | WritePhase::Failed)
    }

    pub fn can_transition_to(self, next: WritePhase) -> bool {
        use WritePhase::*;
        match (self, next) {
            (Idle, Inserting)
            | (Inserting, KeyObtained)
            | (KeyObtained, Fetching)
            | (Fetching, Committed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for WritePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WritePhase::Idle => "Idle",
            WritePhase::Inserting => "Inserting",
            WritePhase::KeyObtained => "KeyObtained",
            WritePhase::Fetching => "Fetching",
            WritePhase::Committed => "Committed",
            WritePhase::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Tracks the phase of a single insert-and-fetch
#[derive(Debug)]
pub struct WriteUnit<'a> {
    table: &'a str,
    phase: WritePhase,
}

impl<'a> WriteUnit<'a> {
    pub fn new(table: &'a str) -> Self {
        Self {
            table,
            phase: WritePhase::Idle,
        }
    }

    pub fn phase(&self) -> WritePhase {
        self.phase
    }

    /// Move to `next`
    ///
    /// # Errors
    ///
    /// `IllegalTransition` when `next` is not reachable from the current phase.
    pub fn advance(&mut self, next: WritePhase) -> relmat_core::Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(RelmatError::IllegalTransition {
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }
        tracing::debug!(
            component = module_path!(),
            op = "write_unit",
            table = self.table,
            from = %self.phase,
            to = %next,
            "write phase transition"
        );
        self.phase = next;
        Ok(())
    }

    /// Mark the unit failed; a no-op once terminal
    pub fn fail(&mut self) {
        if !self.phase.is_terminal() {
            // Failed is reachable from every non-terminal phase
            let _ = self.advance(WritePhase::Failed);
        }
    }
}

/// Insert, recover the generated key, read back
pub struct InsertAndFetchWriter<'c> {
    conn: &'c Connection,
    spec: TableSpec,
}

impl<'c> InsertAndFetchWriter<'c> {
    pub fn new(conn: &'c Connection, spec: TableSpec) -> Self {
        Self { conn, spec }
    }

    pub fn spec(&self) -> &TableSpec {
        &self.spec
    }

    /// Insert one row and return its storage-generated key
    ///
    /// The insert and the key read are one statement inside a savepoint:
    /// a row whose key cannot be recovered is rolled back before returning.
    ///
    /// # Errors
    ///
    /// - `KeyGeneration` when no key (or a NULL key) is returned, including
    ///   when the table has no `key_column` at all
    /// - `Integrity` when storage rejects the row, message unmodified
    /// - `Persistence` for other driver failures
    pub fn insert(&self, attributes: &Attributes) -> Result<Identity> {
        self.conn
            .execute_batch(&format!("SAVEPOINT {}", INSERT_SAVEPOINT))
            .map_err(from_rusqlite)?;

        match self.insert_returning_key(attributes) {
            Ok(id) => {
                self.conn
                    .execute_batch(&format!("RELEASE {}", INSERT_SAVEPOINT))
                    .map_err(from_rusqlite)?;
                Ok(id)
            }
            Err(err) => {
                let undo = format!(
                    "ROLLBACK TO {sp}; RELEASE {sp}",
                    sp = INSERT_SAVEPOINT
                );
                if let Err(e) = self.conn.execute_batch(&undo) {
                    tracing::warn!(
                        component = module_path!(),
                        op = "insert",
                        table = self.spec.table.as_str(),
                        error = %e,
                        "savepoint rollback failed"
                    );
                }
                Err(err)
            }
        }
    }

    fn insert_returning_key(&self, attributes: &Attributes) -> Result<Identity> {
        let sql = self.insert_sql(attributes);
        let params: Vec<_> = attributes.iter().map(|(_, v)| v.clone()).collect();

        let mut stmt = self.conn.prepare(&sql).map_err(from_rusqlite)?;
        let mut rows = SqliteRowSource::new(&mut stmt, &params)?;

        // A key column the table lacks comes back under another name,
        // since SQLite reads an unknown quoted identifier as a string literal
        let key = match rows.next() {
            Some(row) => IdentityKey::lenient(self.spec.key_column.as_str()).extract(&row?)?,
            None => None,
        };

        key.ok_or_else(|| {
            RelmatError::KeyNotGenerated {
                table: self.spec.table.clone(),
                key_column: self.spec.key_column.clone(),
            }
            .into()
        })
    }

    fn insert_sql(&self, attributes: &Attributes) -> String {
        let table = quote_ident(&self.spec.table);
        let key = quote_ident(&self.spec.key_column);
        if attributes.is_empty() {
            return format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, key);
        }
        let columns: Vec<String> = attributes.iter().map(|(c, _)| quote_ident(c)).collect();
        let placeholders: Vec<String> = (1..=attributes.len()).map(|i| format!("?{}", i)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            columns.join(", "),
            placeholders.join(", "),
            key
        )
    }

    /// Read the row with the given key
    ///
    /// # Errors
    ///
    /// - `NotFound` when no row matches
    /// - `Persistence` for driver failures
    pub fn fetch_by_id(&self, id: &Identity) -> Result<FlatRow> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?1",
            quote_ident(&self.spec.table),
            quote_ident(&self.spec.key_column)
        );
        let mut stmt = self.conn.prepare(&sql).map_err(from_rusqlite)?;
        let mut rows = SqliteRowSource::new(&mut stmt, &[id.to_value()])?;

        match rows.next() {
            Some(row) => Ok(row?),
            None => Err(RelmatError::NotFound {
                table: self.spec.table.clone(),
                id: id.to_string(),
            }
            .into()),
        }
    }

    /// Insert, then read the canonical row back in the same scope
    ///
    /// # Errors
    ///
    /// - Everything `insert` returns
    /// - `ConsistencyViolation` when the row just inserted is not visible;
    ///   never retried
    pub fn insert_and_fetch(&self, attributes: &Attributes) -> Result<FlatRow> {
        log_op_start!("insert_and_fetch", table = self.spec.table.as_str());
        let start = std::time::Instant::now();

        let mut unit = WriteUnit::new(&self.spec.table);
        match self.run_unit(&mut unit, attributes) {
            Ok((id, row)) => {
                log_op_end!(
                    "insert_and_fetch",
                    duration_ms = start.elapsed().as_millis() as u64,
                    table = self.spec.table.as_str(),
                    entity_id = %id
                );
                Ok(row)
            }
            Err(err) => {
                unit.fail();
                log_op_error!(
                    "insert_and_fetch",
                    err.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    table = self.spec.table.as_str(),
                    phase = %unit.phase()
                );
                Err(err)
            }
        }
    }

    fn run_unit(
        &self,
        unit: &mut WriteUnit<'_>,
        attributes: &Attributes,
    ) -> Result<(Identity, FlatRow)> {
        unit.advance(WritePhase::Inserting)?;
        let id = self.insert(attributes)?;
        unit.advance(WritePhase::KeyObtained)?;

        unit.advance(WritePhase::Fetching)?;
        let row = self.fetch_by_id(&id).map_err(|err| {
            if err.kind() == ExErrorKind::NotFound {
                ExError::from(RelmatError::ConsistencyViolation {
                    table: self.spec.table.clone(),
                    id: id.to_string(),
                })
                .with_source(err)
            } else {
                err
            }
        })?;

        unit.advance(WritePhase::Committed)?;
        Ok((id, row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_entity_naming() {
        let spec = TableSpec::for_entity("Customer");
        assert_eq!(spec.table, "customers");
        assert_eq!(spec.key_column, "id");
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_phase_transitions() {
        use WritePhase::*;
        assert!(Idle.can_transition_to(Inserting));
        assert!(Fetching.can_transition_to(Committed));
        assert!(Inserting.can_transition_to(Failed));
        assert!(!Idle.can_transition_to(Fetching));
        assert!(!Committed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Idle));
    }

    #[test]
    fn test_write_unit_rejects_skipped_phase() {
        let mut unit = WriteUnit::new("customers");
        let err = unit.advance(WritePhase::KeyObtained).unwrap_err();
        assert_eq!(
            err,
            RelmatError::IllegalTransition {
                from: "Idle".to_string(),
                to: "KeyObtained".to_string()
            }
        );
        assert_eq!(unit.phase(), WritePhase::Idle);
    }

    #[test]
    fn test_fail_is_sticky_after_commit() {
        let mut unit = WriteUnit::new("customers");
        for phase in [
            WritePhase::Inserting,
            WritePhase::KeyObtained,
            WritePhase::Fetching,
            WritePhase::Committed,
        ] {
            unit.advance(phase).unwrap();
        }
        unit.fail();
        assert_eq!(unit.phase(), WritePhase::Committed);
    }

    #[test]
    fn test_insert_sql_shape() {
        let conn = Connection::open_in_memory().unwrap();
        let writer = InsertAndFetchWriter::new(&conn, TableSpec::for_entity("Customer"));
        let attrs = Attributes::new().with("name", "X").with("email", "x@x.com");
        assert_eq!(
            writer.insert_sql(&attrs),
            "INSERT INTO \"customers\" (\"name\", \"email\") VALUES (?1, ?2) RETURNING \"id\""
        );
        assert_eq!(
            writer.insert_sql(&Attributes::new()),
            "INSERT INTO \"customers\" DEFAULT VALUES RETURNING \"id\""
        );
    }
}
