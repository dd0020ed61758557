//! Collaborator model: staff who can be assigned to appointments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Role a collaborator plays at the clinic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "collaborator_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CollaboratorRole {
    /// Primary clinician on appointments.
    Veterinarian,
    /// Secondary participant on appointments.
    Assistant,
}

/// A staff member who can be assigned as an appointment's primary or
/// assistant participant.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Collaborator {
    /// Unique identifier.
    pub id: Uuid,

    /// Full name.
    pub name: String,

    /// Clinic role.
    pub role: CollaboratorRole,

    /// Whether the collaborator currently takes appointments.
    pub active: bool,

    /// Configured shift names (e.g. "morning"). The scheduling crate maps
    /// each name to a slots-per-day capacity.
    pub shifts: Vec<String>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCollaborator {
    /// Full name.
    pub name: String,
    /// Clinic role.
    pub role: CollaboratorRole,
    /// Configured shift names.
    #[serde(default)]
    pub shifts: Vec<String>,
}

impl Collaborator {
    /// Find a collaborator by ID.
    pub async fn find_by_id(
        pool: &sqlx::PgPool,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM collaborators WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Create a new collaborator.
    pub async fn create(
        pool: &sqlx::PgPool,
        input: CreateCollaborator,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO collaborators (name, role, shifts)
            VALUES ($1, $2, $3)
            RETURNING *
            ",
        )
        .bind(&input.name)
        .bind(input.role)
        .bind(&input.shifts)
        .fetch_one(pool)
        .await
    }

    /// List active collaborators, optionally filtered by role.
    pub async fn list_active(
        pool: &sqlx::PgPool,
        role: Option<CollaboratorRole>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        match role {
            Some(role) => {
                sqlx::query_as(
                    "SELECT * FROM collaborators WHERE active = TRUE AND role = $1 ORDER BY name",
                )
                .bind(role)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as("SELECT * FROM collaborators WHERE active = TRUE ORDER BY name")
                    .fetch_all(pool)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&CollaboratorRole::Veterinarian).unwrap();
        assert_eq!(json, "\"veterinarian\"");
        let json = serde_json::to_string(&CollaboratorRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
