//! Business rules layered over the repositories.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::{
    Attendee, AttendeeCount, Event, EventChanges, EventFilter, EventResponse, NewAttendee,
    NewEvent, Pagination,
};
use crate::repositories::{AttendeeRepo, EventRepo};
use crate::utils::error::AppError;

/// Event and registration operations for one request.
pub struct EventService<'a> {
    pool: &'a PgPool,
}

impl<'a> EventService<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_event(&self, new: NewEvent) -> Result<EventResponse, AppError> {
        check_new_window(new.start_time, new.end_time, Utc::now())?;

        let event = EventRepo::new(self.pool).create(new).await?;
        info!(event_id = %event.id, name = %event.name, "Event created");
        Ok(EventResponse::new(event, 0))
    }

    /// Fetch an event, optionally re-expressing its times in an IANA zone.
    pub async fn get_event(
        &self,
        id: Uuid,
        target_timezone: Option<&str>,
    ) -> Result<EventResponse, AppError> {
        // Reject a bad zone before touching the store.
        let tz = target_timezone.map(parse_timezone).transpose()?;

        let event = EventResponse::from(EventRepo::new(self.pool).get_with_count(id).await?);
        Ok(match tz {
            Some(tz) => event.in_timezone(tz),
            None => event,
        })
    }

    pub async fn list_events(
        &self,
        filter: EventFilter,
        page: Option<Pagination>,
    ) -> Result<Vec<EventResponse>, AppError> {
        let events = EventRepo::new(self.pool).list(filter, page).await?;
        Ok(events.into_iter().map(EventResponse::from).collect())
    }

    pub async fn update_event(
        &self,
        id: Uuid,
        changes: EventChanges,
    ) -> Result<EventResponse, AppError> {
        let repo = EventRepo::new(self.pool);
        let current = repo.get(id).await?;
        check_updated_window(&current, &changes, Utc::now())?;

        if changes.is_empty() {
            return self.get_event(id, None).await;
        }

        repo.update(id, changes).await?;
        info!(event_id = %id, "Event updated");
        self.get_event(id, None).await
    }

    pub async fn delete_event(&self, id: Uuid) -> Result<(), AppError> {
        EventRepo::new(self.pool).delete(id).await?;
        info!(event_id = %id, "Event deleted with its attendees");
        Ok(())
    }

    pub async fn register_attendee(
        &self,
        event_id: Uuid,
        new: NewAttendee,
    ) -> Result<Attendee, AppError> {
        let attendee = AttendeeRepo::new(self.pool)
            .register_guarded(event_id, new, Utc::now())
            .await?;
        Ok(attendee)
    }

    pub async fn list_attendees(
        &self,
        event_id: Uuid,
        page: Pagination,
    ) -> Result<Vec<Attendee>, AppError> {
        EventRepo::new(self.pool).get(event_id).await?;
        let attendees = AttendeeRepo::new(self.pool).list(event_id, page).await?;
        Ok(attendees)
    }

    pub async fn count_attendees(&self, event_id: Uuid) -> Result<AttendeeCount, AppError> {
        EventRepo::new(self.pool).get(event_id).await?;
        let count = AttendeeRepo::new(self.pool).count(event_id).await?;
        Ok(AttendeeCount { event_id, count })
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz, AppError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| AppError::ValidationError(format!("Unknown timezone: {}", name)))
}

/// New events must start in the future and end after they start.
pub fn check_new_window(
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if start_time < now {
        return Err(AppError::ValidationError(
            "Event start time cannot be in the past".to_string(),
        ));
    }
    if start_time >= end_time {
        return Err(AppError::ValidationError(
            "Event start time must be before end time".to_string(),
        ));
    }
    Ok(())
}

/// The merged window must stay ordered; a moved start may not be in the past.
pub fn check_updated_window(
    current: &Event,
    changes: &EventChanges,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let start_time = changes.start_time.unwrap_or(current.start_time);
    let end_time = changes.end_time.unwrap_or(current.end_time);

    if let Some(new_start) = changes.start_time {
        if new_start != current.start_time && new_start < now {
            return Err(AppError::ValidationError(
                "Event start time cannot be in the past".to_string(),
            ));
        }
    }
    if start_time >= end_time {
        return Err(AppError::ValidationError(
            "Event start time must be before end time".to_string(),
        ));
    }
    Ok(())
}
