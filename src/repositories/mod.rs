//! Repository layer: parameterized queries against Postgres.
//!
//! Repositories borrow the pool they are handed; nothing here holds a
//! connection beyond a single call. Counts come from explicit `LEFT JOIN`
//! queries rather than loading related rows.

pub mod attendee_repository;
pub mod event_repository;

pub use attendee_repository::AttendeeRepo;
pub use event_repository::EventRepo;

/// Repository error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("attendee already registered for this event")]
    DuplicateRegistration,

    #[error("event capacity of {capacity} reached")]
    CapacityExceeded { capacity: i32 },

    #[error("event has already ended")]
    EventEnded,
}

impl DbError {
    /// Classify a failed write, surfacing constraint violations as
    /// `Integrity` instead of an opaque driver error.
    pub(crate) fn from_write(err: sqlx::Error) -> Self {
        match err.as_database_error() {
            Some(db) if db.is_check_violation() || db.is_foreign_key_violation() => {
                let constraint = db.constraint().unwrap_or("unnamed constraint");
                DbError::Integrity(format!("{} violated", constraint))
            }
            _ => DbError::Sqlx(err),
        }
    }

    pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
        err.as_database_error()
            .map(|db| db.is_foreign_key_violation())
            .unwrap_or(false)
    }
}
