//! Invoice installment model.
//!
//! The reconciler keeps the invariant `sum(amount) == invoice.total`; all
//! amount writes happen through it, inside the caller's transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One scheduled partial payment of an invoice.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct InvoiceInstallment {
    /// Unique identifier.
    pub id: Uuid,

    /// Owning invoice.
    pub invoice_id: Uuid,

    /// When this part is due.
    pub due_date: NaiveDate,

    /// Amount due, rounded to 2 decimal places.
    pub amount: Decimal,

    /// When this part was paid, if it was.
    pub paid_at: Option<DateTime<Utc>>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// Input for one installment row.
#[derive(Debug, Clone)]
pub struct NewInstallment {
    /// When this part is due.
    pub due_date: NaiveDate,
    /// Amount due.
    pub amount: Decimal,
}

impl InvoiceInstallment {
    /// Whether this installment has been paid.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.paid_at.is_some()
    }

    /// Find an installment by ID.
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as("SELECT * FROM invoice_installments WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Insert one installment row.
    pub async fn insert<'e, E>(
        executor: E,
        invoice_id: Uuid,
        input: &NewInstallment,
    ) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            r"
            INSERT INTO invoice_installments (invoice_id, due_date, amount)
            VALUES ($1, $2, $3)
            RETURNING *
            ",
        )
        .bind(invoice_id)
        .bind(input.due_date)
        .bind(input.amount)
        .fetch_one(executor)
        .await
    }

    /// List an invoice's installments ordered by due date (ties broken by
    /// creation order, matching the reconciler's notion of "last").
    pub async fn list_by_invoice<'e, E>(
        executor: E,
        invoice_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            r"
            SELECT * FROM invoice_installments
            WHERE invoice_id = $1
            ORDER BY due_date, created_at, id
            ",
        )
        .bind(invoice_id)
        .fetch_all(executor)
        .await
    }

    /// Overwrite the amount of one installment.
    pub async fn update_amount<'e, E>(
        executor: E,
        id: Uuid,
        amount: Decimal,
    ) -> Result<bool, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let result = sqlx::query("UPDATE invoice_installments SET amount = $2 WHERE id = $1")
            .bind(id)
            .bind(amount)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark an unpaid installment paid. Returns `false` when it is missing
    /// or already paid.
    pub async fn mark_paid<'e, E>(
        executor: E,
        id: Uuid,
        paid_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let result = sqlx::query(
            r"
            UPDATE invoice_installments
            SET paid_at = $2
            WHERE id = $1 AND paid_at IS NULL
            ",
        )
        .bind(id)
        .bind(paid_at)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count an invoice's paid and unpaid installments as `(paid, unpaid)`.
    pub async fn count_paid_unpaid<'e, E>(
        executor: E,
        invoice_id: Uuid,
    ) -> Result<(i64, i64), sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            r"
            SELECT
                COUNT(*) FILTER (WHERE paid_at IS NOT NULL),
                COUNT(*) FILTER (WHERE paid_at IS NULL)
            FROM invoice_installments
            WHERE invoice_id = $1
            ",
        )
        .bind(invoice_id)
        .fetch_one(executor)
        .await
    }
}
