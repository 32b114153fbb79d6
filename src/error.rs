//! Error types shared by the repository, query builder and CRUD factory.
//!
//! Database failures are translated into a small set of HTTP-oriented
//! variants so callers can map them straight onto response codes.

use sea_orm::{DbErr, SqlErr};

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, CrudError>;

/// Errors produced by CRUD operations
#[derive(Debug, thiserror::Error)]
pub enum CrudError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Unsupported(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Database(#[from] DbErr),
}

impl CrudError {
    /// HTTP status code this error corresponds to.
    pub fn status_code(&self) -> u16 {
        match self {
            CrudError::NotFound(_) => 404,
            CrudError::Conflict(_) => 409,
            CrudError::Forbidden(_) => 403,
            CrudError::Validation(_) => 422,
            CrudError::Unsupported(_) => 400,
            CrudError::Config(_) | CrudError::Internal(_) | CrudError::Database(_) => 500,
        }
    }

    pub fn not_found(id: impl std::fmt::Display) -> Self {
        CrudError::NotFound(format!("Entity with ID {} not found.", id))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CrudError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, CrudError::Conflict(_))
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, CrudError::Forbidden(_))
    }
}

/// Whether a database error reports a unique constraint violation.
///
/// Classification goes through the driver's error code (SQLSTATE `23505` on
/// Postgres), never through the formatted message.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Translate an error raised while talking to the database.
///
/// Unique violations become [`CrudError::Conflict`], errors that are already
/// translated pass through untouched, everything else is reported as an
/// internal failure.
pub fn translate(err: CrudError) -> CrudError {
    match err {
        CrudError::Database(db_err) => {
            if is_unique_violation(&db_err) {
                log::warn!("Unique constraint violation: {}", db_err);
                CrudError::Conflict("Duplicate entry detected.".to_string())
            } else {
                log::error!("Database operation failed: {}", db_err);
                CrudError::Internal(format!("Database operation failed: {}", db_err))
            }
        }
        other => other,
    }
}
