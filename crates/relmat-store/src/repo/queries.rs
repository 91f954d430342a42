//! Joined report queries
//!
//! The join aliases follow the column convention the materializer relies on:
//! the customer key is `cid`, the order key is `oid`. Neither query carries
//! an `ORDER BY` for grouping purposes; the materializer does not need one.

use relmat_core::model::{Customer, CustomerOrderCount, CustomerWithOrders, Order};
use relmat_core::{map_rows, materialize, IdentityKey};
use rusqlite::Connection;

use crate::errors::Result;
use crate::source::with_row_source;

const CUSTOMERS_WITH_ORDERS: &str = "\
    SELECT c.id AS cid, c.name AS name, c.email AS email, o.id AS oid, o.sku AS sku \
    FROM customers c LEFT JOIN orders o ON o.customer_fk = c.id";

const CUSTOMER_ORDER_COUNTS: &str = "\
    SELECT c.id, c.name, c.email, \
        (SELECT COUNT(*) FROM orders o WHERE o.customer_fk = c.id) AS order_count \
    FROM customers c ORDER BY c.id";

/// Every customer with the orders it placed
///
/// Customers come back in the order their first row arrived; each
/// customer's orders are in ascending id order. Customers without orders
/// have an empty list.
///
/// # Errors
///
/// - `Persistence` / `Mapping`
pub fn customers_with_orders(conn: &Connection) -> Result<Vec<CustomerWithOrders>> {
    let parents = with_row_source(conn, CUSTOMERS_WITH_ORDERS, &[], |rows| {
        materialize(
            rows,
            IdentityKey::new("cid"),
            IdentityKey::new("oid"),
            |row| Customer::from_row_keyed(row, "cid"),
            |row| Order::from_row_keyed(row, "oid"),
        )
    })?;
    Ok(parents.into_iter().map(CustomerWithOrders::from).collect())
}

/// One row per customer with the number of orders it placed
///
/// # Errors
///
/// - `Persistence` / `Mapping`
pub fn customer_order_counts(conn: &Connection) -> Result<Vec<CustomerOrderCount>> {
    with_row_source(conn, CUSTOMER_ORDER_COUNTS, &[], |rows| {
        map_rows(rows, CustomerOrderCount::from_row)
    })
}
