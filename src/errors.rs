use sea_orm::error::DbErr;
use uuid::Uuid;

/// Errors surfaced by the record services and their collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::ExternalServiceError(err.to_string())
    }
}

impl ServiceError {
    /// `NotFound` for a record kind and id, e.g. "Product 3f2a... not found".
    pub fn not_found(kind: &str, id: Uuid) -> Self {
        ServiceError::NotFound(format!("{} {} not found", kind, id))
    }
}

pub type AppError = ServiceError;
