pub mod customer;
pub mod order;

pub use customer::{Customer, CustomerOrderCount, CustomerWithOrders, NewCustomer};
pub use order::{NewOrder, Order};
