//! Orders placed by existing customers

use relmat_core::model::{NewOrder, Order};
use relmat_core::repository::RepoResult;
use relmat_core::{map_rows, Value};
use rusqlite::Connection;

use crate::source::with_row_source;
use crate::writer::{InsertAndFetchWriter, TableSpec};

pub struct SqliteOrderRepo<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteOrderRepo<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Insert an order for `customer_id` and return the persisted row
    ///
    /// # Errors
    ///
    /// - `Integrity` when `customer_id` does not reference a customer
    ///   (foreign keys are enforced by `db::configure`)
    /// - Everything `InsertAndFetchWriter::insert_and_fetch` returns
    pub fn save(&self, customer_id: i64, sku: &str) -> RepoResult<Order> {
        let order = NewOrder::new(customer_id, sku);
        let writer = InsertAndFetchWriter::new(self.conn, TableSpec::for_entity("Order"));
        let row = writer.insert_and_fetch(&order.attributes())?;
        Ok(Order::from_row(&row)?)
    }

    /// Orders for one customer in ascending id order
    ///
    /// # Errors
    ///
    /// - `Persistence` / `Mapping`
    pub fn find_by_customer(&self, customer_id: i64) -> RepoResult<Vec<Order>> {
        with_row_source(
            self.conn,
            "SELECT id, sku FROM orders WHERE customer_fk = ?1 ORDER BY id",
            &[Value::Integer(customer_id)],
            |rows| map_rows(rows, Order::from_row),
        )
    }
}
