//! Invoice status catalog, seeded by migration and looked up by slug.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Stable slug of the open status.
pub const STATUS_OPEN: &str = "open";

/// Stable slug of the partially-paid status.
pub const STATUS_PARTIALLY_PAID: &str = "partially_paid";

/// Stable slug of the terminal paid status.
pub const STATUS_PAID: &str = "paid";

/// One row of the invoice status catalog.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct InvoiceStatus {
    /// Unique identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Stable slug (`open`, `partially_paid`, `paid`).
    pub slug: String,
}

impl InvoiceStatus {
    /// Look a status up by slug. The seed rows are installed by migration;
    /// a missing row is a deployment defect, not a user error.
    pub async fn find_by_slug<'e, E>(
        executor: E,
        slug: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as("SELECT * FROM invoice_statuses WHERE slug = $1")
            .bind(slug)
            .fetch_optional(executor)
            .await
    }

    /// Find a status by ID.
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as("SELECT * FROM invoice_statuses WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Whether this is the terminal paid status.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.slug == STATUS_PAID
    }
}
