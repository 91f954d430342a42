//! Transaction boundary
//!
//! Every multi-step write composes inside `run_in_transaction`. The closure
//! sees a `Transaction`, which derefs to `Connection`, so writers and
//! repositories built on `&Connection` work unchanged inside it.

use relmat_core::{log_op_end, log_op_error, log_op_start};
use rusqlite::{Connection, Transaction};

use crate::errors::{from_rusqlite, Result};

/// Run `f` in a transaction: commit on `Ok`, roll back on `Err`
///
/// All-or-nothing: when `f` fails, nothing it wrote is persisted.
///
/// # Errors
///
/// The error returned by `f`, or a failure to begin or commit.
pub fn run_in_transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&Transaction<'_>) -> Result<T>,
{
    log_op_start!("run_in_transaction");
    let start = std::time::Instant::now();

    let tx = conn.transaction().map_err(from_rusqlite)?;

    match f(&tx) {
        Ok(value) => {
            if let Err(e) = tx.commit() {
                let err = from_rusqlite(e);
                log_op_error!(
                    "run_in_transaction",
                    err.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
                return Err(err);
            }
            log_op_end!(
                "run_in_transaction",
                duration_ms = start.elapsed().as_millis() as u64
            );
            Ok(value)
        }
        Err(err) => {
            if let Err(rb) = tx.rollback() {
                tracing::warn!(
                    component = module_path!(),
                    op = "run_in_transaction",
                    error = %rb,
                    "rollback failed"
                );
            }
            log_op_error!(
                "run_in_transaction",
                err.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                rolled_back = true
            );
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relmat_core::{ExError, ExErrorKind};

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v TEXT)").unwrap();
        conn
    }

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_commit_on_ok() {
        let mut conn = conn();
        let out = run_in_transaction(&mut conn, |tx| {
            tx.execute("INSERT INTO t VALUES ('a')", [])
                .map_err(from_rusqlite)?;
            Ok(7)
        })
        .unwrap();
        assert_eq!(out, 7);
        assert_eq!(count(&conn), 1);
    }

    #[test]
    fn test_rollback_on_err() {
        let mut conn = conn();
        let result: Result<()> = run_in_transaction(&mut conn, |tx| {
            tx.execute("INSERT INTO t VALUES ('a')", [])
                .map_err(from_rusqlite)?;
            Err(ExError::new(ExErrorKind::Internal).with_message("stop"))
        });
        assert_eq!(result.unwrap_err().kind(), ExErrorKind::Internal);
        assert_eq!(count(&conn), 0);
    }
}
