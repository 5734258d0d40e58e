//! Attendee repository
//!
//! `register` is the plain insert; referential integrity comes from the
//! foreign key. `register_guarded` additionally enforces the registration
//! rules inside one transaction that holds the event row lock, so
//! concurrent sign-ups for the same event are serialized.

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use tracing::{debug, info};
use uuid::Uuid;

use super::DbError;
use crate::models::{Attendee, NewAttendee, Pagination};

/// Attendee repository
pub struct AttendeeRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> AttendeeRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an attendee bound to `event_id`.
    ///
    /// A dangling `event_id` is reported as the event being not found.
    pub async fn register(&self, event_id: Uuid, new: NewAttendee) -> Result<Attendee, DbError> {
        let attendee: Attendee = sqlx::query_as(
            r#"
            INSERT INTO attendees (id, event_id, name, email)
            VALUES ($1, $2, $3, $4)
            RETURNING id, event_id, name, email, registered_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event_id)
        .bind(&new.name)
        .bind(&new.email)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if DbError::is_foreign_key_violation(&e) {
                event_not_found(event_id)
            } else {
                DbError::from_write(e)
            }
        })?;

        debug!(event_id = %event_id, attendee_id = %attendee.id, "Attendee inserted");
        Ok(attendee)
    }

    /// Register with capacity, duplicate and event-ended checks.
    ///
    /// Checks run in order: event exists, email not yet registered, seats
    /// left, event not over.
    pub async fn register_guarded(
        &self,
        event_id: Uuid,
        new: NewAttendee,
        now: DateTime<Utc>,
    ) -> Result<Attendee, DbError> {
        let mut tx = self.pool.begin().await?;

        let event: Option<(i32, DateTime<Utc>)> = sqlx::query_as(
            "SELECT max_capacity, end_time FROM events WHERE id = $1 FOR UPDATE",
        )
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (max_capacity, end_time) = event.ok_or_else(|| event_not_found(event_id))?;

        if fetch_by_email(&mut *tx, event_id, &new.email).await?.is_some() {
            return Err(DbError::DuplicateRegistration);
        }

        let registered: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM attendees WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(&mut *tx)
                .await?;

        if registered.0 >= i64::from(max_capacity) {
            return Err(DbError::CapacityExceeded {
                capacity: max_capacity,
            });
        }

        if end_time < now {
            return Err(DbError::EventEnded);
        }

        let attendee: Attendee = sqlx::query_as(
            r#"
            INSERT INTO attendees (id, event_id, name, email, registered_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, event_id, name, email, registered_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event_id)
        .bind(&new.name)
        .bind(&new.email)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::from_write)?;

        tx.commit().await?;

        info!(
            event_id = %event_id,
            attendee_id = %attendee.id,
            seats_taken = registered.0 + 1,
            max_capacity,
            "Attendee registered"
        );
        Ok(attendee)
    }

    /// Attendees of an event in registration order.
    pub async fn list(&self, event_id: Uuid, page: Pagination) -> Result<Vec<Attendee>, DbError> {
        let attendees = sqlx::query_as(
            r#"
            SELECT id, event_id, name, email, registered_at
            FROM attendees
            WHERE event_id = $1
            ORDER BY registered_at ASC, id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(event_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(attendees)
    }

    pub async fn count(&self, event_id: Uuid) -> Result<i64, DbError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM attendees WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Existing registration for `email`, which must already be normalized.
    pub async fn find_by_email(
        &self,
        event_id: Uuid,
        email: &str,
    ) -> Result<Option<Attendee>, DbError> {
        fetch_by_email(self.pool, event_id, email).await
    }
}

async fn fetch_by_email<'e, E>(
    executor: E,
    event_id: Uuid,
    email: &str,
) -> Result<Option<Attendee>, DbError>
where
    E: Executor<'e, Database = Postgres>,
{
    let attendee = sqlx::query_as(
        r#"
        SELECT id, event_id, name, email, registered_at
        FROM attendees
        WHERE event_id = $1 AND email = $2
        LIMIT 1
        "#,
    )
    .bind(event_id)
    .bind(email)
    .fetch_optional(executor)
    .await?;

    Ok(attendee)
}

fn event_not_found(event_id: Uuid) -> DbError {
    DbError::NotFound {
        resource: "Event",
        id: event_id.to_string(),
    }
}
