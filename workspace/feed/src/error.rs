use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::debug;

/// Error types for the feed operations
#[derive(Error, Debug)]
pub enum FeedError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// A looked-up record does not exist
    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    /// Submitted form data was rejected
    #[error("Invalid value for '{field}': {message}")]
    Validation { field: &'static str, message: String },
}

pub type Result<T> = std::result::Result<T, FeedError>;

impl FeedError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        FeedError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        FeedError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Turn a unique constraint violation into a validation error on `field`,
    /// leaving every other database error untouched.
    pub(crate) fn from_insert(err: DbErr, field: &'static str, message: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                debug!(field, %detail, "Unique constraint violated");
                FeedError::validation(field, message)
            }
            _ => FeedError::Database(err),
        }
    }
}
