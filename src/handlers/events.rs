use axum::extract::State;
use axum::response::Response;

use crate::extractors::{EventId, ValidatedJson, ValidatedQuery};
use crate::models::{
    CreateEventRequest, EventChanges, EventListQuery, EventQuery, NewEvent, UpdateEventRequest,
};
use crate::services::EventService;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

/// POST /events
pub async fn create_event(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CreateEventRequest>,
) -> Result<Response, AppError> {
    let event = EventService::new(&state.pool)
        .create_event(NewEvent::from(body))
        .await?;

    Ok(created(event, "Event created successfully"))
}

/// GET /events
pub async fn list_events(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<EventListQuery>,
) -> Result<Response, AppError> {
    let events = EventService::new(&state.pool)
        .list_events(query.filter(), query.page())
        .await?;

    Ok(success(events, "Events retrieved successfully"))
}

/// GET /events/:id
pub async fn get_event(
    State(state): State<AppState>,
    EventId(id): EventId,
    ValidatedQuery(query): ValidatedQuery<EventQuery>,
) -> Result<Response, AppError> {
    let event = EventService::new(&state.pool)
        .get_event(id, query.target_timezone.as_deref())
        .await?;

    Ok(success(event, "Event retrieved successfully"))
}

/// PUT /events/:id
pub async fn replace_event(
    State(state): State<AppState>,
    EventId(id): EventId,
    ValidatedJson(body): ValidatedJson<CreateEventRequest>,
) -> Result<Response, AppError> {
    let changes = EventChanges::from(NewEvent::from(body));
    let event = EventService::new(&state.pool)
        .update_event(id, changes)
        .await?;

    Ok(success(event, "Event updated successfully"))
}

/// PATCH /events/:id
pub async fn update_event(
    State(state): State<AppState>,
    EventId(id): EventId,
    ValidatedJson(body): ValidatedJson<UpdateEventRequest>,
) -> Result<Response, AppError> {
    let event = EventService::new(&state.pool)
        .update_event(id, EventChanges::from(body))
        .await?;

    Ok(success(event, "Event updated successfully"))
}

/// DELETE /events/:id
pub async fn delete_event(
    State(state): State<AppState>,
    EventId(id): EventId,
) -> Result<Response, AppError> {
    EventService::new(&state.pool).delete_event(id).await?;
    Ok(empty_success("Event deleted successfully"))
}
