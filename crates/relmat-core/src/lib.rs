//! relmat core - row-to-tree materialization
//!
//! This crate provides the storage-independent half of relmat:
//! - `FlatRow` / `Value`: one row of a joined result, addressable by column
//! - Identity key extraction with explicit NullIdentity
//! - `GroupingMaterializer`: order-independent grouping of joined rows into
//!   parent aggregates with identity-keyed children
//! - Customer/order domain model and the repository interface
//! - Error facility and structured logging facility

pub mod errors;
pub mod identity;
pub mod logging_facility;
pub mod materialize;
pub mod model;
pub mod repository;
pub mod row;

// Used by the logging macros
#[doc(hidden)]
pub use relmat_core_types;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, RelmatError, Result};
pub use identity::{Identity, IdentityKey};
pub use materialize::{map_rows, materialize, GroupingMaterializer, ParentRecord};
pub use row::{Attributes, FlatRow, Value};
