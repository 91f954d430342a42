//! Repositories and joined report queries over SQLite

pub mod customer_repo;
pub mod order_repo;
pub mod queries;

pub use customer_repo::SqliteCustomerRepo;
pub use order_repo::SqliteOrderRepo;
