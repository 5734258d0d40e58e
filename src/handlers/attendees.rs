use axum::extract::State;
use axum::response::Response;

use crate::extractors::{EventId, ValidatedJson, ValidatedQuery};
use crate::models::{NewAttendee, PaginationParams, RegisterAttendeeRequest};
use crate::services::EventService;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

/// POST /events/:id/register
pub async fn register_attendee(
    State(state): State<AppState>,
    EventId(event_id): EventId,
    ValidatedJson(body): ValidatedJson<RegisterAttendeeRequest>,
) -> Result<Response, AppError> {
    let attendee = EventService::new(&state.pool)
        .register_attendee(event_id, NewAttendee::from(body))
        .await?;

    Ok(created(attendee, "Attendee registered successfully"))
}

/// GET /events/:id/attendees
pub async fn list_attendees(
    State(state): State<AppState>,
    EventId(event_id): EventId,
    ValidatedQuery(params): ValidatedQuery<PaginationParams>,
) -> Result<Response, AppError> {
    let attendees = EventService::new(&state.pool)
        .list_attendees(event_id, params.page())
        .await?;

    Ok(success(attendees, "Attendees retrieved successfully"))
}

/// GET /events/:id/attendees/count
pub async fn count_attendees(
    State(state): State<AppState>,
    EventId(event_id): EventId,
) -> Result<Response, AppError> {
    let count = EventService::new(&state.pool)
        .count_attendees(event_id)
        .await?;

    Ok(success(count, "Attendee count retrieved successfully"))
}
