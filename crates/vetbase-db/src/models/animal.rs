//! Animal model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An animal registered to a tutor.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Animal {
    /// Unique identifier.
    pub id: Uuid,

    /// Owning tutor.
    pub tutor_id: Uuid,

    /// Call name.
    pub name: String,

    /// Species (dog, cat, ...).
    pub species: String,

    /// Breed, if known.
    pub breed: Option<String>,

    /// Whether the animal is an active patient.
    pub active: bool,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for registering an animal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAnimal {
    /// Owning tutor.
    pub tutor_id: Uuid,
    /// Call name.
    pub name: String,
    /// Species.
    pub species: String,
    /// Breed, if known.
    pub breed: Option<String>,
}

impl Animal {
    /// Find an animal by ID.
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as("SELECT * FROM animals WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Register a new animal.
    pub async fn create(pool: &sqlx::PgPool, input: CreateAnimal) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO animals (tutor_id, name, species, breed)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            ",
        )
        .bind(input.tutor_id)
        .bind(&input.name)
        .bind(&input.species)
        .bind(&input.breed)
        .fetch_one(pool)
        .await
    }

    /// List a tutor's animals.
    pub async fn list_by_tutor(
        pool: &sqlx::PgPool,
        tutor_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM animals WHERE tutor_id = $1 ORDER BY name")
            .bind(tutor_id)
            .fetch_all(pool)
            .await
    }
}
