use serde::Serialize;

use crate::errors::Result;
use crate::materialize::ParentRecord;
use crate::row::{Attributes, FlatRow};

use super::order::Order;

/// A persisted customer row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    /// Storage-generated identifier
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl Customer {
    /// Build from a row whose key column is `id`
    pub fn from_row(row: &FlatRow) -> Result<Self> {
        Self::from_row_keyed(row, "id")
    }

    /// Build from a row whose key column is aliased (e.g. `cid` in a join)
    pub fn from_row_keyed(row: &FlatRow, id_column: &str) -> Result<Self> {
        Ok(Self {
            id: row.i64(id_column)?,
            name: row.text("name")?,
            email: row.text("email")?,
        })
    }
}

/// Insert input for a customer; the identifier is assigned by storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
}

impl NewCustomer {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn attributes(&self) -> Attributes {
        Attributes::new()
            .with("name", self.name.as_str())
            .with("email", self.email.as_str())
    }
}

/// A customer with the number of orders that reference it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerOrderCount {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub order_count: i64,
}

impl CustomerOrderCount {
    pub fn from_row(row: &FlatRow) -> Result<Self> {
        Ok(Self {
            id: row.i64("id")?,
            name: row.text("name")?,
            email: row.text("email")?,
            order_count: row.i64("order_count")?,
        })
    }
}

/// A customer aggregate owning its orders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerWithOrders {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Orders in ascending id order
    pub orders: Vec<Order>,
}

impl From<ParentRecord<Customer, Order>> for CustomerWithOrders {
    fn from(parent: ParentRecord<Customer, Order>) -> Self {
        let (customer, orders) = parent.into_parts();
        Self {
            id: customer.id,
            name: customer.name,
            email: customer.email,
            orders,
        }
    }
}
