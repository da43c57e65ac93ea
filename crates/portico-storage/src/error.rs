use thiserror::Error;

/// Storage-specific error types for the Portico event store.
///
/// Callers only need to distinguish three cases: a duplicate enrollment, a
/// missing employee, and everything else, which means the store is
/// unavailable (see [`StorageError::is_unavailable`]).
#[derive(Debug, Error)]
pub enum StorageError {
    /// An employee with this identification is already enrolled
    #[error("Employee already enrolled: {identification}")]
    DuplicateIdentity { identification: String },

    /// Entity not found in database
    #[error("Entity not found: {entity_type} with {field}={value}")]
    NotFound {
        entity_type: String,
        field: String,
        value: String,
    },

    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    /// Build a [`StorageError::NotFound`] for an employee.
    pub fn employee_not_found(identification: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Employee".to_string(),
            field: "identification".to_string(),
            value: identification.into(),
        }
    }

    /// True for every failure that is not a duplicate or a missing row.
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, Self::DuplicateIdentity { .. } | Self::NotFound { .. })
    }

    /// Map an insert failure, turning a primary-key violation into
    /// [`StorageError::DuplicateIdentity`].
    pub(crate) fn from_insert(error: sqlx::Error, identification: &str) -> Self {
        if let sqlx::Error::Database(db_error) = &error
            && (db_error.is_unique_violation()
                || db_error.message().contains("UNIQUE constraint failed"))
        {
            return Self::DuplicateIdentity {
                identification: identification.to_string(),
            };
        }
        Self::Database(error)
    }
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
