//! relmat store - SQLite bindings for the row materializer
//!
//! Provides:
//! - Connection helpers and embedded, checksummed migrations
//! - `SqliteRowSource`: a forward-only cursor yielding `FlatRow`s
//! - `InsertAndFetchWriter`: insert, recover the generated key, read back
//! - `run_in_transaction`: the all-or-nothing boundary writes compose inside
//! - Customer/order repositories and the joined report queries

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;
pub mod source;
pub mod tx;
pub mod writer;

// Re-export key types
pub use errors::Result;
pub use repo::{SqliteCustomerRepo, SqliteOrderRepo};
pub use source::SqliteRowSource;
pub use tx::run_in_transaction;
pub use writer::{InsertAndFetchWriter, TableSpec, WritePhase};
