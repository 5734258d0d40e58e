use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::pagination::{Pagination, PaginationParams, MAX_LIMIT};
use crate::validators::validate_not_blank;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_capacity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Event row joined with its current registration count.
#[derive(Debug, Clone, FromRow)]
pub struct EventWithCount {
    #[sqlx(flatten)]
    pub event: Event,
    pub current_attendees: i64,
}

/// Fields for inserting a new event.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub name: String,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_capacity: i32,
}

/// Partial update; `None` leaves the stored column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventChanges {
    pub name: Option<String>,
    pub location: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub max_capacity: Option<i32>,
}

impl EventChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.location.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.max_capacity.is_none()
    }
}

impl From<NewEvent> for EventChanges {
    fn from(event: NewEvent) -> Self {
        Self {
            name: Some(event.name),
            location: Some(event.location),
            start_time: Some(event.start_time),
            end_time: Some(event.end_time),
            max_capacity: Some(event.max_capacity),
        }
    }
}

/// Listing filter for `GET /events`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Drop events whose end time has already passed.
    pub upcoming_only: bool,
    /// Only events starting strictly after this instant.
    pub starts_after: Option<DateTime<Utc>>,
}

/// Body of `POST /events` and `PUT /events/:id`.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_event_window"))]
pub struct CreateEventRequest {
    #[validate(
        length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(
        length(min = 1, max = 255, message = "Location must be between 1 and 255 characters"),
        custom(function = "validate_not_blank")
    )]
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[validate(range(min = 1, message = "Max capacity must be a positive number"))]
    pub max_capacity: i32,
}

fn validate_event_window(req: &CreateEventRequest) -> Result<(), ValidationError> {
    if req.start_time >= req.end_time {
        let mut error = ValidationError::new("invalid_event_window");
        error.message = Some("Event start time must be before end time".into());
        return Err(error);
    }
    Ok(())
}

impl From<CreateEventRequest> for NewEvent {
    fn from(req: CreateEventRequest) -> Self {
        Self {
            name: req.name.trim().to_string(),
            location: req.location.trim().to_string(),
            start_time: req.start_time,
            end_time: req.end_time,
            max_capacity: req.max_capacity,
        }
    }
}

/// Body of `PATCH /events/:id`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateEventRequest {
    #[validate(
        length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,
    #[validate(
        length(min = 1, max = 255, message = "Location must be between 1 and 255 characters"),
        custom(function = "validate_not_blank")
    )]
    pub location: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[validate(range(min = 1, message = "Max capacity must be a positive number"))]
    pub max_capacity: Option<i32>,
}

impl From<UpdateEventRequest> for EventChanges {
    fn from(req: UpdateEventRequest) -> Self {
        Self {
            name: req.name.map(|name| name.trim().to_string()),
            location: req.location.map(|location| location.trim().to_string()),
            start_time: req.start_time,
            end_time: req.end_time,
            max_capacity: req.max_capacity,
        }
    }
}

/// Query string of `GET /events/:id`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct EventQuery {
    /// IANA zone name, e.g. `Asia/Kolkata`.
    pub target_timezone: Option<String>,
}

/// Query string of `GET /events`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct EventListQuery {
    #[serde(default)]
    pub include_past: bool,
    pub starts_after: Option<DateTime<Utc>>,
    #[validate(range(min = 0, message = "skip must not be negative"))]
    pub skip: Option<i64>,
    #[validate(range(min = 1, max = MAX_LIMIT, message = "limit must be between 1 and 200"))]
    pub limit: Option<i64>,
}

impl EventListQuery {
    pub fn filter(&self) -> EventFilter {
        EventFilter {
            upcoming_only: !self.include_past,
            starts_after: self.starts_after,
        }
    }

    pub fn page(&self) -> Option<Pagination> {
        PaginationParams {
            skip: self.skip,
            limit: self.limit,
        }
        .optional_page()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventResponse {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub max_capacity: i32,
    pub current_attendees: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventResponse {
    pub fn new(event: Event, current_attendees: i64) -> Self {
        Self {
            id: event.id,
            name: event.name,
            location: event.location,
            start_time: event.start_time.fixed_offset(),
            end_time: event.end_time.fixed_offset(),
            max_capacity: event.max_capacity,
            current_attendees,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }

    /// Re-express the event window in `tz`. The instants are unchanged.
    pub fn in_timezone(mut self, tz: Tz) -> Self {
        self.start_time = self.start_time.with_timezone(&tz).fixed_offset();
        self.end_time = self.end_time.with_timezone(&tz).fixed_offset();
        self
    }
}

impl From<EventWithCount> for EventResponse {
    fn from(row: EventWithCount) -> Self {
        Self::new(row.event, row.current_attendees)
    }
}
