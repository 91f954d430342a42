//! Error handling for relmat-store
//!
//! Wraps relmat-core ExError with store-specific helpers. SQLite constraint
//! failures surface as `Integrity` with the driver's message untouched;
//! every other driver failure is `Persistence`.

use relmat_core::errors::{ExError, ExErrorKind, RelmatError};
use rusqlite::ErrorCode;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Classify a driver error in the canonical taxonomy
pub fn classify(err: &rusqlite::Error) -> ExErrorKind {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            ExErrorKind::Integrity
        }
        _ => ExErrorKind::Persistence,
    }
}

/// Create a store error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(classify(&err))
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Same classification, for code paths that speak `RelmatError`
/// (row sources feeding the materializer)
pub fn relmat_from_rusqlite(err: rusqlite::Error) -> RelmatError {
    match classify(&err) {
        ExErrorKind::Integrity => RelmatError::Integrity {
            message: err.to_string(),
        },
        _ => RelmatError::Persistence {
            message: err.to_string(),
        },
    }
}

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error for an already-applied migration
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::Integrity)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: recorded {}, embedded {}",
            migration_id, expected, actual
        ))
}
