use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Edit or cancellation attempted inside the lock window before start.
    #[error("Locked: {0}")]
    LockWindow(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DomainError::NotFound {
            entity,
            field: "id",
            value: id.into(),
        }
    }

    /// Machine-readable error kind surfaced to API callers.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::NotFound { .. } => "NotFoundError",
            DomainError::Validation(_) => "ValidationError",
            DomainError::Conflict(_) => "ConflictError",
            DomainError::LockWindow(_) => "LockWindowError",
            DomainError::Timeout(_) => "TimeoutError",
            DomainError::Storage(_) => "StorageError",
        }
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Storage(e.to_string())
    }
}
