use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};
use validator::ValidationErrors;

use crate::repositories::DbError;
use crate::utils::response::error as error_response;
use crate::validators::{validation_details, validation_summary};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid fields: {0}")]
    InvalidFields(#[from] ValidationErrors),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Integrity error: {0}")]
    IntegrityError(String),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidFields(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::IntegrityError(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::InvalidFields(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::IntegrityError(_) => "INTEGRITY_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => {
                warn!(code = self.code(), message = %msg, "Request rejected");
            }
            AppError::InvalidFields(errors) => {
                warn!(code = self.code(), errors = %errors, "Request rejected");
            }
            AppError::IntegrityError(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
        }
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { resource, id } => {
                AppError::NotFound(format!("{} with id '{}' was not found", resource, id))
            }
            DbError::DuplicateRegistration => AppError::Conflict(
                "Attendee with this email is already registered for this event".to_string(),
            ),
            DbError::CapacityExceeded { capacity } => AppError::Conflict(format!(
                "Event has reached its maximum capacity of {}",
                capacity
            )),
            DbError::EventEnded => AppError::ValidationError(
                "Cannot register for an event that has already ended".to_string(),
            ),
            DbError::Integrity(msg) => AppError::IntegrityError(msg),
            DbError::Sqlx(e) => AppError::DatabaseError(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log internal details
        self.log();

        // Only expose high-level message to the client
        let (public_message, details) = match &self {
            AppError::ValidationError(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::IntegrityError(msg) => (msg.clone(), None),
            AppError::InvalidFields(errors) => {
                (validation_summary(errors), Some(validation_details(errors)))
            }
            AppError::DatabaseError(_) => ("A database error occurred".to_string(), None),
        };

        error_response(code, public_message, details, status)
    }
}
