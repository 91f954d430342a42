//! Consumer-facing CRUD surface and save hooks
//!
//! `CustomerRepository` is an explicitly coded interface: each query is a
//! named method backed by hand-written SQL in the storage crate. There is no
//! query derivation from method names.

use relmat_core_types::Sensitive;

use crate::errors::ExError;
use crate::model::{Customer, NewCustomer};

/// Result type for repository operations
pub type RepoResult<T> = std::result::Result<T, ExError>;

/// CRUD access to customers
pub trait CustomerRepository {
    /// Insert a customer and return the canonical persisted row
    ///
    /// # Errors
    ///
    /// - `KeyGeneration`: storage returned no identifier
    /// - `ConsistencyViolation`: the inserted row could not be read back
    /// - `Integrity`: storage rejected the row (e.g. duplicate email)
    fn save(&self, customer: &NewCustomer) -> RepoResult<Customer>;

    /// All customers in ascending id order
    ///
    /// # Errors
    ///
    /// - `Persistence` / `Mapping`
    fn find_all(&self) -> RepoResult<Vec<Customer>>;

    /// Customer by identifier, `None` when absent
    ///
    /// # Errors
    ///
    /// - `Persistence` / `Mapping`
    fn find_by_id(&self, id: i64) -> RepoResult<Option<Customer>>;

    /// Customer by email address, `None` when absent
    ///
    /// # Errors
    ///
    /// - `Persistence` / `Mapping`
    fn find_by_email(&self, email: &str) -> RepoResult<Option<Customer>>;
}

/// Callback invoked before a repository writes a customer
///
/// Hooks observe; they cannot veto the save.
///
/// # Example
/// ```
/// use relmat_core::model::NewCustomer;
/// use relmat_core::repository::{NoopSaveHook, SaveHook};
///
/// let hook = NoopSaveHook;
/// hook.before_save(&NewCustomer::new("mia", "mia@mia.com"));
/// ```
pub trait SaveHook {
    fn before_save(&self, customer: &NewCustomer);
}

/// Hook that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSaveHook;

impl SaveHook for NoopSaveHook {
    fn before_save(&self, _customer: &NewCustomer) {}
}

/// Hook that logs each customer about to be saved, email masked to its domain
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSaveHook;

impl SaveHook for LoggingSaveHook {
    fn before_save(&self, customer: &NewCustomer) {
        let email = Sensitive::email(customer.email.as_str());
        tracing::info!(
            component = module_path!(),
            op = "before_save",
            name = customer.name.as_str(),
            email = %email,
            "about to save the customer"
        );
    }
}
