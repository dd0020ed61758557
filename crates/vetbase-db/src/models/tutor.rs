//! Tutor model: animal owners and invoice payers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A tutor (animal owner).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Tutor {
    /// Unique identifier.
    pub id: Uuid,

    /// Full name.
    pub name: String,

    /// Contact e-mail.
    pub email: Option<String>,

    /// Contact phone number.
    pub phone: Option<String>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a tutor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTutor {
    /// Full name.
    pub name: String,
    /// Contact e-mail.
    pub email: Option<String>,
    /// Contact phone number.
    pub phone: Option<String>,
}

impl Tutor {
    /// Find a tutor by ID.
    pub async fn find_by_id(
        pool: &sqlx::PgPool,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM tutors WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Create a new tutor.
    pub async fn create(pool: &sqlx::PgPool, input: CreateTutor) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO tutors (name, email, phone)
            VALUES ($1, $2, $3)
            RETURNING *
            ",
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .fetch_one(pool)
        .await
    }

    /// List tutors ordered by name.
    pub async fn list(
        pool: &sqlx::PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM tutors ORDER BY name LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
