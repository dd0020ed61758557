//! Product model with atomic stock adjustment.
//!
//! Stock is only ever written through [`Product::increment_stock`] and
//! [`Product::try_decrement_stock`], always inside the caller's transaction.
//! The decrement is a conditional row update (`... AND stock >= qty`) so
//! concurrent decrements cannot drive stock below zero even under weak
//! isolation; the `CHECK (stock >= 0)` constraint backs it up.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A stocked product.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier.
    pub id: Uuid,

    /// Display name.
    pub name: String,

    /// Units currently on hand. Never negative.
    pub stock: i32,

    /// Reorder threshold; at or below it the product shows up in the
    /// low-stock listing.
    pub min_stock: i32,

    /// Whether the product may appear on invoices and attendances.
    pub sellable: bool,

    /// Whether the product is active in the catalog.
    pub active: bool,

    /// Acquisition cost per unit.
    pub cost_price: Decimal,

    /// Sale price per unit.
    pub sale_price: Decimal,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProduct {
    /// Display name.
    pub name: String,
    /// Opening stock.
    pub stock: i32,
    /// Reorder threshold.
    pub min_stock: i32,
    /// Acquisition cost per unit.
    pub cost_price: Decimal,
    /// Sale price per unit.
    pub sale_price: Decimal,
}

impl Product {
    /// Find a product by ID.
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Create a new product.
    pub async fn create(pool: &sqlx::PgPool, input: CreateProduct) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO products (name, stock, min_stock, cost_price, sale_price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            ",
        )
        .bind(&input.name)
        .bind(input.stock)
        .bind(input.min_stock)
        .bind(input.cost_price)
        .bind(input.sale_price)
        .fetch_one(pool)
        .await
    }

    /// Unconditionally add `quantity` units of stock.
    ///
    /// Returns `false` when the product does not exist.
    pub async fn increment_stock<'e, E>(
        executor: E,
        id: Uuid,
        quantity: i32,
    ) -> Result<bool, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let result = sqlx::query(
            r"
            UPDATE products
            SET stock = stock + $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(quantity)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove `quantity` units of stock if, and only if, enough are on hand.
    ///
    /// Returns `false` when the product does not exist or has fewer than
    /// `quantity` units; no row is touched in that case.
    pub async fn try_decrement_stock<'e, E>(
        executor: E,
        id: Uuid,
        quantity: i32,
    ) -> Result<bool, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let result = sqlx::query(
            r"
            UPDATE products
            SET stock = stock - $2, updated_at = NOW()
            WHERE id = $1 AND stock >= $2
            ",
        )
        .bind(id)
        .bind(quantity)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List products whose stock is at or below their reorder threshold.
    pub async fn list_below_minimum(pool: &sqlx::PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM products
            WHERE active = TRUE AND stock <= min_stock
            ORDER BY name
            ",
        )
        .fetch_all(pool)
        .await
    }

    /// Whether the product may be billed right now.
    #[must_use]
    pub fn is_billable(&self) -> bool {
        self.active && self.sellable
    }
}
