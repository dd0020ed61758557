//! Invoice item model.
//!
//! An item with `attendance_id` set was derived from that attendance and is
//! owned by the synchronizer: it is deleted and recreated on every resync
//! and cannot be removed on its own. An item with `attendance_id` NULL is a
//! manual line and is never touched by resynchronization.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One line of an invoice.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct InvoiceItem {
    /// Unique identifier.
    pub id: Uuid,

    /// Owning invoice.
    pub invoice_id: Uuid,

    /// Line description.
    pub description: String,

    /// Units billed.
    pub quantity: i32,

    /// Price per unit.
    pub unit_price: Decimal,

    /// `quantity * unit_price`, rounded to 2 decimal places.
    pub total: Decimal,

    /// The attendance this line was derived from; NULL for manual lines.
    pub attendance_id: Option<Uuid>,

    /// The product this line sells, when it sells one. Product-linked lines
    /// move stock when added and removed.
    pub product_id: Option<Uuid>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// Input for one invoice item row.
#[derive(Debug, Clone)]
pub struct NewInvoiceItem {
    /// Line description.
    pub description: String,
    /// Units billed.
    pub quantity: i32,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Line total.
    pub total: Decimal,
    /// Source attendance, when derived.
    pub attendance_id: Option<Uuid>,
    /// Sold product, when product-linked.
    pub product_id: Option<Uuid>,
}

impl InvoiceItem {
    /// Whether this line was derived from an attendance.
    #[must_use]
    pub fn is_attendance_linked(&self) -> bool {
        self.attendance_id.is_some()
    }

    /// Find an item by ID.
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as("SELECT * FROM invoice_items WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Insert one item row.
    pub async fn insert<'e, E>(
        executor: E,
        invoice_id: Uuid,
        item: &NewInvoiceItem,
    ) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            r"
            INSERT INTO invoice_items
                (invoice_id, description, quantity, unit_price, total, attendance_id, product_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            ",
        )
        .bind(invoice_id)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total)
        .bind(item.attendance_id)
        .bind(item.product_id)
        .fetch_one(executor)
        .await
    }

    /// List all items of an invoice.
    pub async fn list_by_invoice<'e, E>(
        executor: E,
        invoice_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as("SELECT * FROM invoice_items WHERE invoice_id = $1 ORDER BY created_at, id")
            .bind(invoice_id)
            .fetch_all(executor)
            .await
    }

    /// List items linked to an attendance (these reveal the invoice that
    /// backs the attendance, if one exists).
    pub async fn list_by_attendance<'e, E>(
        executor: E,
        attendance_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as("SELECT * FROM invoice_items WHERE attendance_id = $1 ORDER BY id")
            .bind(attendance_id)
            .fetch_all(executor)
            .await
    }

    /// Re-link manual product lines that now correspond to a product the
    /// attendance consumes, so resynchronization does not duplicate them.
    /// Returns the number of re-linked rows.
    pub async fn relink_manual_product_items<'e, E>(
        executor: E,
        invoice_id: Uuid,
        attendance_id: Uuid,
        product_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let result = sqlx::query(
            r"
            UPDATE invoice_items
            SET attendance_id = $2
            WHERE invoice_id = $1
              AND attendance_id IS NULL
              AND product_id = ANY($3)
            ",
        )
        .bind(invoice_id)
        .bind(attendance_id)
        .bind(product_ids)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Sum of the manual (attendance-unlinked) line totals on an invoice.
    pub async fn sum_manual_items<'e, E>(
        executor: E,
        invoice_id: Uuid,
    ) -> Result<Decimal, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_scalar(
            r"
            SELECT COALESCE(SUM(total), 0) FROM invoice_items
            WHERE invoice_id = $1 AND attendance_id IS NULL
            ",
        )
        .bind(invoice_id)
        .fetch_one(executor)
        .await
    }

    /// Delete the attendance-linked items of an invoice ahead of recreating
    /// them from fresh derivation. Manual lines are untouched.
    pub async fn delete_attendance_linked<'e, E>(
        executor: E,
        invoice_id: Uuid,
        attendance_id: Uuid,
    ) -> Result<u64, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let result = sqlx::query(
            "DELETE FROM invoice_items WHERE invoice_id = $1 AND attendance_id = $2",
        )
        .bind(invoice_id)
        .bind(attendance_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete one item row.
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let result = sqlx::query("DELETE FROM invoice_items WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
