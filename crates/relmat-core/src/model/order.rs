use serde::Serialize;

use crate::errors::Result;
use crate::row::{Attributes, FlatRow};

/// A persisted order row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: i64,
    pub sku: String,
}

impl Order {
    pub fn from_row(row: &FlatRow) -> Result<Self> {
        Self::from_row_keyed(row, "id")
    }

    pub fn from_row_keyed(row: &FlatRow, id_column: &str) -> Result<Self> {
        Ok(Self {
            id: row.i64(id_column)?,
            sku: row.text("sku")?,
        })
    }
}

/// Insert input for an order placed by an existing customer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: i64,
    pub sku: String,
}

impl NewOrder {
    pub fn new(customer_id: i64, sku: impl Into<String>) -> Self {
        Self {
            customer_id,
            sku: sku.into(),
        }
    }

    pub fn attributes(&self) -> Attributes {
        Attributes::new()
            .with("customer_fk", self.customer_id)
            .with("sku", self.sku.as_str())
    }
}
