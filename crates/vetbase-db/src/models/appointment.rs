//! Appointment model.
//!
//! Status transitions are expressed as conditional updates so a stale caller
//! cannot, for example, complete an appointment twice; callers check the
//! returned row / row count.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle status of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "appointment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    /// Booked, not yet confirmed by the tutor.
    Scheduled,
    /// Confirmed by the tutor.
    Confirmed,
    /// The visit happened; an attendance is linked.
    Completed,
}

/// A booked visit occupying the half-open interval
/// `[scheduled_start, scheduled_end)`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Appointment {
    /// Unique identifier.
    pub id: Uuid,

    /// The animal to be seen.
    pub animal_id: Uuid,

    /// The tutor bringing the animal.
    pub tutor_id: Uuid,

    /// Primary collaborator.
    pub veterinarian_id: Uuid,

    /// Optional secondary collaborator.
    pub assistant_id: Option<Uuid>,

    /// Interval start (inclusive).
    pub scheduled_start: DateTime<Utc>,

    /// Interval end (exclusive). Always after the start.
    pub scheduled_end: DateTime<Utc>,

    /// Lifecycle status.
    pub status: AppointmentStatus,

    /// When the tutor confirmed, if they did.
    pub confirmed_at: Option<DateTime<Utc>>,

    /// The attendance derived on completion, set exactly once.
    pub attendance_id: Option<Uuid>,

    /// Free-text notes.
    pub notes: Option<String>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for booking an appointment. The interval has been validated by the
/// caller (`scheduled_end > scheduled_start`); the table CHECK re-enforces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointment {
    /// The animal to be seen.
    pub animal_id: Uuid,
    /// The tutor bringing the animal.
    pub tutor_id: Uuid,
    /// Primary collaborator.
    pub veterinarian_id: Uuid,
    /// Optional secondary collaborator.
    pub assistant_id: Option<Uuid>,
    /// Interval start.
    pub scheduled_start: DateTime<Utc>,
    /// Interval end.
    pub scheduled_end: DateTime<Utc>,
    /// Free-text notes.
    pub notes: Option<String>,
}

impl Appointment {
    /// Find an appointment by ID.
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as("SELECT * FROM appointments WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Book a new appointment (status starts at `scheduled`).
    pub async fn insert(
        pool: &sqlx::PgPool,
        input: &CreateAppointment,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO appointments
                (animal_id, tutor_id, veterinarian_id, assistant_id,
                 scheduled_start, scheduled_end, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            ",
        )
        .bind(input.animal_id)
        .bind(input.tutor_id)
        .bind(input.veterinarian_id)
        .bind(input.assistant_id)
        .bind(input.scheduled_start)
        .bind(input.scheduled_end)
        .bind(&input.notes)
        .fetch_one(pool)
        .await
    }

    /// List appointments whose start falls inside `[start, end]`, optionally
    /// restricted to one collaborator in either role.
    pub async fn list_between(
        pool: &sqlx::PgPool,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        collaborator_id: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        match collaborator_id {
            Some(collaborator_id) => {
                sqlx::query_as(
                    r"
                    SELECT * FROM appointments
                    WHERE scheduled_start BETWEEN $1 AND $2
                      AND (veterinarian_id = $3 OR assistant_id = $3)
                    ORDER BY scheduled_start
                    ",
                )
                .bind(start)
                .bind(end)
                .bind(collaborator_id)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as(
                    r"
                    SELECT * FROM appointments
                    WHERE scheduled_start BETWEEN $1 AND $2
                    ORDER BY scheduled_start
                    ",
                )
                .bind(start)
                .bind(end)
                .fetch_all(pool)
                .await
            }
        }
    }

    /// Count non-completed appointments starting inside `[start, end]`,
    /// optionally restricted to one collaborator in either role.
    pub async fn count_non_completed_between(
        pool: &sqlx::PgPool,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        collaborator_id: Option<Uuid>,
    ) -> Result<i64, sqlx::Error> {
        match collaborator_id {
            Some(collaborator_id) => {
                sqlx::query_scalar(
                    r"
                    SELECT COUNT(*) FROM appointments
                    WHERE scheduled_start BETWEEN $1 AND $2
                      AND status <> 'completed'
                      AND (veterinarian_id = $3 OR assistant_id = $3)
                    ",
                )
                .bind(start)
                .bind(end)
                .bind(collaborator_id)
                .fetch_one(pool)
                .await
            }
            None => {
                sqlx::query_scalar(
                    r"
                    SELECT COUNT(*) FROM appointments
                    WHERE scheduled_start BETWEEN $1 AND $2
                      AND status <> 'completed'
                    ",
                )
                .bind(start)
                .bind(end)
                .fetch_one(pool)
                .await
            }
        }
    }

    /// Confirm a scheduled appointment. Returns `None` when the appointment
    /// is missing or not in the `scheduled` state.
    pub async fn confirm<'e, E>(
        executor: E,
        id: Uuid,
        confirmed_at: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            r"
            UPDATE appointments
            SET status = 'confirmed', confirmed_at = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'scheduled'
            RETURNING *
            ",
        )
        .bind(id)
        .bind(confirmed_at)
        .fetch_optional(executor)
        .await
    }

    /// Move a non-completed appointment to a new interval, resetting it to
    /// `scheduled` and clearing the confirmation timestamp.
    pub async fn reschedule<'e, E>(
        executor: E,
        id: Uuid,
        scheduled_start: DateTime<Utc>,
        scheduled_end: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            r"
            UPDATE appointments
            SET scheduled_start = $2, scheduled_end = $3,
                status = 'scheduled', confirmed_at = NULL, updated_at = NOW()
            WHERE id = $1 AND status <> 'completed'
            RETURNING *
            ",
        )
        .bind(id)
        .bind(scheduled_start)
        .bind(scheduled_end)
        .fetch_optional(executor)
        .await
    }

    /// Mark an appointment completed and link its attendance. Succeeds at
    /// most once per appointment; returns `false` if it was already
    /// completed (or missing).
    pub async fn mark_completed<'e, E>(
        executor: E,
        id: Uuid,
        attendance_id: Uuid,
    ) -> Result<bool, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let result = sqlx::query(
            r"
            UPDATE appointments
            SET status = 'completed', attendance_id = $2, updated_at = NOW()
            WHERE id = $1 AND status <> 'completed'
            ",
        )
        .bind(id)
        .bind(attendance_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete an appointment. The service layer refuses deletion when an
    /// attendance is already linked.
    pub async fn delete(pool: &sqlx::PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
