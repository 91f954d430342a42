//! Types shared by the relmat logging facility and its callers
//!
//! - `Sensitive<T>`: values masked in every log and serialization path
//! - `schema`: field keys and event names for operation boundary events

pub mod schema;
pub mod sensitive;

pub use sensitive::Sensitive;
