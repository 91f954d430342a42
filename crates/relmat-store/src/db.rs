//! Database connection management
//!
//! Pooling and driver configuration beyond these pragmas are left to the
//! embedding application.

use crate::errors::{from_rusqlite, Result};
use rusqlite::Connection;
use std::path::Path;

/// Open a SQLite database at the given path, configured and migrated
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let mut conn = Connection::open(path).map_err(from_rusqlite)?;
    configure(&conn)?;
    crate::migrations::apply_migrations(&mut conn)?;
    Ok(conn)
}

/// Open an in-memory SQLite database, configured and migrated
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().map_err(from_rusqlite)?;
    configure(&conn)?;
    crate::migrations::apply_migrations(&mut conn)?;
    Ok(conn)
}

/// Configure a connection: foreign keys on
pub fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(from_rusqlite)?;
    Ok(())
}
