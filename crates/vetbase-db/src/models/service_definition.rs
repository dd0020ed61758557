//! Service definition model: the billable catalog (consultation, vaccine, ...).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A predefined billable service.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ServiceDefinition {
    /// Unique identifier.
    pub id: Uuid,

    /// Display name (e.g. "Consultation").
    pub name: String,

    /// Default unit price applied when an attendance line does not override it.
    pub default_price: Decimal,

    /// Whether the definition can be attached to new attendances.
    pub active: bool,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a service definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateServiceDefinition {
    /// Display name.
    pub name: String,
    /// Default unit price.
    pub default_price: Decimal,
}

impl ServiceDefinition {
    /// Find a definition by ID.
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as("SELECT * FROM service_definitions WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Create a new definition.
    pub async fn create(
        pool: &sqlx::PgPool,
        input: CreateServiceDefinition,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO service_definitions (name, default_price)
            VALUES ($1, $2)
            RETURNING *
            ",
        )
        .bind(&input.name)
        .bind(input.default_price)
        .fetch_one(pool)
        .await
    }

    /// List active definitions ordered by name.
    pub async fn list_active(pool: &sqlx::PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM service_definitions WHERE active = TRUE ORDER BY name")
            .fetch_all(pool)
            .await
    }
}
