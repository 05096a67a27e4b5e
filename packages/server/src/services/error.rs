use common::storage::StorageError;
use sea_orm::DbErr;
use thiserror::Error;

/// Outcome taxonomy shared by every component behind the coordinator.
///
/// `Dependency` covers anything that is not the caller's fault: a remote
/// service or store that is unreachable or misbehaving. It is safe to retry.
/// The message of `Dependency` is for logs only and never reaches a client.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("dependency failure: {0}")]
    Dependency(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<DbErr> for ServiceError {
    fn from(err: DbErr) -> Self {
        ServiceError::Dependency(format!("relational store: {err}"))
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::TooLarge { limit, .. } => {
                ServiceError::Validation(format!("Photo exceeds maximum size of {limit} bytes"))
            }
            other => ServiceError::Dependency(format!("blob store: {other}")),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
