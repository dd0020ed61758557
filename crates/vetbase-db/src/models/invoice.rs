//! Invoice model.
//!
//! The `total` column is only ever written by the billing services
//! (synchronizer, item mutation); nothing else hand-adjusts it.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A billable invoice with items and installments.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier.
    pub id: Uuid,

    /// The tutor who owes the invoice.
    pub tutor_id: Uuid,

    /// Current status (row of `invoice_statuses`).
    pub status_id: Uuid,

    /// Sum of item totals. Recomputed, never hand-edited.
    pub total: Decimal,

    /// When payment is due.
    pub due_date: NaiveDate,

    /// When the invoice was fully paid, if it was.
    pub paid_at: Option<DateTime<Utc>>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an invoice row.
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    /// The tutor who owes the invoice.
    pub tutor_id: Uuid,
    /// Initial status (the `open` seed).
    pub status_id: Uuid,
    /// Initial total.
    pub total: Decimal,
    /// When payment is due.
    pub due_date: NaiveDate,
}

impl Invoice {
    /// Find an invoice by ID.
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as("SELECT * FROM invoices WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Insert a new invoice row.
    pub async fn insert<'e, E>(executor: E, input: &CreateInvoice) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            r"
            INSERT INTO invoices (tutor_id, status_id, total, due_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            ",
        )
        .bind(input.tutor_id)
        .bind(input.status_id)
        .bind(input.total)
        .bind(input.due_date)
        .fetch_one(executor)
        .await
    }

    /// Update the derived header fields after a resynchronization.
    pub async fn update_derived<'e, E>(
        executor: E,
        id: Uuid,
        total: Decimal,
        due_date: NaiveDate,
        tutor_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            r"
            UPDATE invoices
            SET total = $2, due_date = $3, tutor_id = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(total)
        .bind(due_date)
        .bind(tutor_id)
        .fetch_optional(executor)
        .await
    }

    /// Recompute the total as the straight sum of the invoice's current
    /// items (used by manual item mutation, distinct from derivation).
    pub async fn recompute_total_from_items<'e, E>(
        executor: E,
        id: Uuid,
    ) -> Result<Decimal, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_scalar(
            r"
            UPDATE invoices
            SET total = COALESCE(
                    (SELECT SUM(total) FROM invoice_items WHERE invoice_id = $1), 0),
                updated_at = NOW()
            WHERE id = $1
            RETURNING total
            ",
        )
        .bind(id)
        .fetch_one(executor)
        .await
    }

    /// Move the invoice to another status, optionally stamping `paid_at`.
    pub async fn set_status<'e, E>(
        executor: E,
        id: Uuid,
        status_id: Uuid,
        paid_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            r"
            UPDATE invoices
            SET status_id = $2, paid_at = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(status_id)
        .bind(paid_at)
        .fetch_optional(executor)
        .await
    }
}
