//! Event repository
//!
//! Every method is a single statement against the pool:
//! - create: INSERT ... RETURNING
//! - get / list: LEFT JOIN for attendee counts (no N+1)
//! - update: COALESCE per column so absent fields keep their stored value
//! - delete: attendees go with the event (ON DELETE CASCADE)

use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::DbError;
use crate::models::{Event, EventChanges, EventFilter, EventWithCount, NewEvent, Pagination};

const RESOURCE: &str = "Event";

/// Event repository
pub struct EventRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> EventRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an event under a freshly generated id.
    pub async fn create(&self, new: NewEvent) -> Result<Event, DbError> {
        let event: Event = sqlx::query_as(
            r#"
            INSERT INTO events (id, name, location, start_time, end_time, max_capacity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, location, start_time, end_time, max_capacity,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.location)
        .bind(new.start_time)
        .bind(new.end_time)
        .bind(new.max_capacity)
        .fetch_one(self.pool)
        .await
        .map_err(DbError::from_write)?;

        debug!(event_id = %event.id, "Event inserted");
        Ok(event)
    }

    pub async fn get(&self, id: Uuid) -> Result<Event, DbError> {
        sqlx::query_as(
            r#"
            SELECT id, name, location, start_time, end_time, max_capacity,
                   created_at, updated_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    /// Get an event together with its current attendee count.
    pub async fn get_with_count(&self, id: Uuid) -> Result<EventWithCount, DbError> {
        sqlx::query_as(
            r#"
            SELECT e.id, e.name, e.location, e.start_time, e.end_time, e.max_capacity,
                   e.created_at, e.updated_at,
                   COUNT(a.id) AS current_attendees
            FROM events e
            LEFT JOIN attendees a ON a.event_id = e.id
            WHERE e.id = $1
            GROUP BY e.id
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    /// List events ordered by start time.
    ///
    /// `page = None` returns every matching row.
    pub async fn list(
        &self,
        filter: EventFilter,
        page: Option<Pagination>,
    ) -> Result<Vec<EventWithCount>, DbError> {
        let page = page.unwrap_or_else(Pagination::unbounded);

        let events = sqlx::query_as(
            r#"
            SELECT e.id, e.name, e.location, e.start_time, e.end_time, e.max_capacity,
                   e.created_at, e.updated_at,
                   COUNT(a.id) AS current_attendees
            FROM events e
            LEFT JOIN attendees a ON a.event_id = e.id
            WHERE ($1 = FALSE OR e.end_time >= NOW())
              AND ($2::TIMESTAMPTZ IS NULL OR e.start_time > $2)
            GROUP BY e.id
            ORDER BY e.start_time ASC, e.id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.upcoming_only)
        .bind(filter.starts_after)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(events)
    }

    /// Apply `changes`, leaving unset fields untouched.
    pub async fn update(&self, id: Uuid, changes: EventChanges) -> Result<Event, DbError> {
        let event = sqlx::query_as(
            r#"
            UPDATE events
            SET name = COALESCE($2, name),
                location = COALESCE($3, location),
                start_time = COALESCE($4, start_time),
                end_time = COALESCE($5, end_time),
                max_capacity = COALESCE($6, max_capacity),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, location, start_time, end_time, max_capacity,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.location)
        .bind(changes.start_time)
        .bind(changes.end_time)
        .bind(changes.max_capacity)
        .fetch_optional(self.pool)
        .await
        .map_err(DbError::from_write)?
        .ok_or_else(|| not_found(id))?;

        debug!(event_id = %id, "Event updated");
        Ok(event)
    }

    /// Delete an event and, through the foreign key, its attendees.
    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        debug!(event_id = %id, "Event deleted");
        Ok(())
    }
}

fn not_found(id: Uuid) -> DbError {
    DbError::NotFound {
        resource: RESOURCE,
        id: id.to_string(),
    }
}
