//! `CustomerRepository` backed by SQLite
//!
//! Every query is hand-written; `save` goes through the insert-and-fetch
//! writer so callers always get the canonical persisted row.

use relmat_core::model::{Customer, NewCustomer};
use relmat_core::repository::{CustomerRepository, NoopSaveHook, RepoResult, SaveHook};
use relmat_core::{map_rows, Value};
use rusqlite::Connection;

use crate::source::with_row_source;
use crate::writer::{InsertAndFetchWriter, TableSpec};

const SELECT_CUSTOMERS: &str = "SELECT id, name, email FROM customers";

/// SQLite customer repository
///
/// Borrows a connection; hand it `&tx` to make several saves atomic.
pub struct SqliteCustomerRepo<'c, H: SaveHook = NoopSaveHook> {
    conn: &'c Connection,
    hook: H,
}

impl<'c> SqliteCustomerRepo<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            conn,
            hook: NoopSaveHook,
        }
    }
}

impl<'c, H: SaveHook> SqliteCustomerRepo<'c, H> {
    /// Repository that notifies `hook` before every save
    pub fn with_hook(conn: &'c Connection, hook: H) -> Self {
        Self { conn, hook }
    }

    fn find_one(&self, predicate: &str, param: Value) -> RepoResult<Option<Customer>> {
        let sql = format!("{} WHERE {}", SELECT_CUSTOMERS, predicate);
        let mut found = with_row_source(self.conn, &sql, &[param], |rows| {
            map_rows(rows, Customer::from_row)
        })?;
        Ok(if found.is_empty() {
            None
        } else {
            Some(found.swap_remove(0))
        })
    }
}

impl<H: SaveHook> CustomerRepository for SqliteCustomerRepo<'_, H> {
    fn save(&self, customer: &NewCustomer) -> RepoResult<Customer> {
        self.hook.before_save(customer);
        let writer = InsertAndFetchWriter::new(self.conn, TableSpec::for_entity("Customer"));
        let row = writer.insert_and_fetch(&customer.attributes())?;
        Ok(Customer::from_row(&row)?)
    }

    fn find_all(&self) -> RepoResult<Vec<Customer>> {
        let sql = format!("{} ORDER BY id", SELECT_CUSTOMERS);
        with_row_source(self.conn, &sql, &[], |rows| {
            map_rows(rows, Customer::from_row)
        })
    }

    fn find_by_id(&self, id: i64) -> RepoResult<Option<Customer>> {
        self.find_one("id = ?1", Value::Integer(id))
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<Customer>> {
        self.find_one("email = ?1", Value::from(email))
    }
}
