use thiserror::Error;

/// Result type alias using RelmatError
pub type Result<T> = std::result::Result<T, RelmatError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers can match on without
/// parsing messages. None of these kinds is retried inside relmat; retry
/// policy belongs to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Row mapping
    /// Row schema disagrees with the column convention (missing column,
    /// wrong type, null parent key)
    Mapping,

    // Write path
    /// An insert did not yield a storage-generated identifier
    KeyGeneration,
    NotFound,
    /// A row written in this scope could not be read back in the same scope
    ConsistencyViolation,
    /// Constraint violation reported by storage
    Integrity,
    /// Write unit asked to move between phases that are not adjacent
    IllegalTransition,

    // Integration/IO
    InvalidInput,
    Io,
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Mapping => "ERR_MAPPING",
            ExErrorKind::KeyGeneration => "ERR_KEY_GENERATION",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::ConsistencyViolation => "ERR_CONSISTENCY_VIOLATION",
            ExErrorKind::Integrity => "ERR_INTEGRITY",
            ExErrorKind::IllegalTransition => "ERR_ILLEGAL_TRANSITION",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification kind for programmatic handling plus optional
/// context (operation, table, entity id) for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    table: Option<String>,
    entity_id: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            table: None,
            entity_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add table context
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the table context, if any
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(table) = &self.table {
            write!(f, " (table: {})", table)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for row materialization and write round-trips
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelmatError {
    // ===== Mapping Errors =====
    /// A column required by the naming convention is absent from the row schema
    #[error("Column not present in row: {column}")]
    MissingColumn { column: String },

    /// A column holds a value of the wrong storage class
    #[error("Column {column} expected {expected}, found {found}")]
    ColumnType {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A row lacks its own parent key
    #[error("Parent identity column {column} is null")]
    NullParentIdentity { column: String },

    /// A column cannot serve as an identity (e.g. REAL values)
    #[error("Column {column} holds {found}, which cannot be used as an identity")]
    UnsupportedIdentity { column: String, found: &'static str },

    // ===== Write Errors =====
    /// Insert completed without returning a generated key
    #[error("Insert into {table} did not return a generated {key_column}")]
    KeyNotGenerated { table: String, key_column: String },

    /// No row matches the requested identity
    #[error("No row in {table} with id {id}")]
    NotFound { table: String, id: String },

    /// Fetch-after-insert found nothing in the same scope
    #[error("Row {id} inserted into {table} is not visible to the same scope")]
    ConsistencyViolation { table: String, id: String },

    /// Storage constraint violation, message passed through unmodified
    #[error("{message}")]
    Integrity { message: String },

    /// Write unit phase transition that the state machine does not allow
    #[error("Illegal write phase transition: {from} -> {to}")]
    IllegalTransition { from: String, to: String },

    /// Row source or storage driver failure
    #[error("Storage error: {message}")]
    Persistence { message: String },

    // ===== Generic Errors =====
    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl RelmatError {
    /// Classification of this error in the canonical taxonomy
    pub fn kind(&self) -> ExErrorKind {
        match self {
            RelmatError::MissingColumn { .. }
            | RelmatError::ColumnType { .. }
            | RelmatError::NullParentIdentity { .. }
            | RelmatError::UnsupportedIdentity { .. } => ExErrorKind::Mapping,
            RelmatError::KeyNotGenerated { .. } => ExErrorKind::KeyGeneration,
            RelmatError::NotFound { .. } => ExErrorKind::NotFound,
            RelmatError::ConsistencyViolation { .. } => ExErrorKind::ConsistencyViolation,
            RelmatError::Integrity { .. } => ExErrorKind::Integrity,
            RelmatError::IllegalTransition { .. } => ExErrorKind::IllegalTransition,
            RelmatError::Persistence { .. } => ExErrorKind::Persistence,
            RelmatError::Serialization { .. } => ExErrorKind::Serialization,
            RelmatError::Internal { .. } => ExErrorKind::Internal,
        }
    }
}

/// Conversion from RelmatError to ExError
///
/// Core modules return `RelmatError`; storage-facing code returns `ExError`
/// so that `?` lifts one into the other.
impl From<RelmatError> for ExError {
    fn from(err: RelmatError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        let ex = ExError::new(kind).with_message(message);
        match err {
            RelmatError::MissingColumn { column }
            | RelmatError::ColumnType { column, .. }
            | RelmatError::NullParentIdentity { column }
            | RelmatError::UnsupportedIdentity { column, .. } => {
                ex.with_op("map_row").with_entity_id(column)
            }
            RelmatError::KeyNotGenerated { table, .. } => ex.with_op("insert").with_table(table),
            RelmatError::NotFound { table, id } => {
                ex.with_op("fetch_by_id").with_table(table).with_entity_id(id)
            }
            RelmatError::ConsistencyViolation { table, id } => ex
                .with_op("insert_and_fetch")
                .with_table(table)
                .with_entity_id(id),
            RelmatError::Integrity { .. }
            | RelmatError::IllegalTransition { .. }
            | RelmatError::Persistence { .. }
            | RelmatError::Serialization { .. }
            | RelmatError::Internal { .. } => ex,
        }
    }
}

impl From<serde_json::Error> for RelmatError {
    fn from(err: serde_json::Error) -> Self {
        RelmatError::Serialization {
            message: err.to_string(),
        }
    }
}
