use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::validators::validate_not_blank;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Attendee {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub email: String,
    pub registered_at: DateTime<Utc>,
}

/// Attendee fields ready for insertion.
///
/// Built from a request, `email` is trimmed and lowercased in full (local
/// part included), so `Ada@Example.com` and `ada@example.com` count as the
/// same registration and the stored address is the lowercased form.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendee {
    pub name: String,
    pub email: String,
}

/// Body of `POST /events/:id/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterAttendeeRequest {
    #[validate(
        length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(
        email(message = "Invalid email format"),
        length(max = 320, message = "Email must be at most 320 characters")
    )]
    pub email: String,
}

impl From<RegisterAttendeeRequest> for NewAttendee {
    fn from(req: RegisterAttendeeRequest) -> Self {
        Self {
            name: req.name.trim().to_string(),
            // Duplicate detection compares normalized addresses.
            email: req.email.trim().to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendeeCount {
    pub event_id: Uuid,
    pub count: i64,
}
