//! Attendance model: a billable clinical visit with its catalog and product
//! line items.
//!
//! Item rows are replaced wholesale when an attendance is edited, inside the
//! same transaction as the matching stock adjustments, so every function here
//! is generic over the executor.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The kind of clinical visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "attendance_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttendanceKind {
    /// Regular consultation.
    Consultation,
    /// Vaccination visit.
    Vaccination,
    /// Surgical procedure.
    Surgery,
    /// Laboratory or imaging exam.
    Exam,
    /// Grooming and hygiene.
    Grooming,
    /// Anything else.
    Other,
}

impl AttendanceKind {
    /// Human-readable name, used for synthetic invoice lines.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            AttendanceKind::Consultation => "Consultation",
            AttendanceKind::Vaccination => "Vaccination",
            AttendanceKind::Surgery => "Surgery",
            AttendanceKind::Exam => "Exam",
            AttendanceKind::Grooming => "Grooming",
            AttendanceKind::Other => "Attendance",
        }
    }
}

/// A completed or in-progress clinical visit record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attendance {
    /// Unique identifier.
    pub id: Uuid,

    /// The animal seen.
    pub animal_id: Uuid,

    /// Kind of visit.
    pub kind: AttendanceKind,

    /// Date of the visit.
    pub date: NaiveDate,

    /// Price of the visit: explicit, or the sum of catalog-item totals.
    pub price: Decimal,

    /// Free-text clinical notes.
    pub notes: Option<String>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A billable line referencing a predefined service definition.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AttendanceCatalogItem {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning attendance.
    pub attendance_id: Uuid,
    /// The service definition billed.
    pub definition_id: Uuid,
    /// Units billed; repetition is carried here, not by duplicate rows.
    pub quantity: i32,
    /// Price per unit.
    pub unit_price: Decimal,
    /// `quantity * unit_price`, rounded to 2 decimal places.
    pub total: Decimal,
}

/// A line for a product consumed during the visit.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AttendanceProductItem {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning attendance.
    pub attendance_id: Uuid,
    /// The product consumed.
    pub product_id: Uuid,
    /// Units consumed.
    pub quantity: i32,
    /// Price per unit.
    pub unit_price: Decimal,
    /// `quantity * unit_price`, rounded to 2 decimal places.
    pub total: Decimal,
}

/// Input for creating an attendance row. The price has already been resolved
/// by the service layer (explicit, or derived from catalog items).
#[derive(Debug, Clone)]
pub struct CreateAttendance {
    /// The animal seen.
    pub animal_id: Uuid,
    /// Kind of visit.
    pub kind: AttendanceKind,
    /// Date of the visit.
    pub date: NaiveDate,
    /// Resolved price.
    pub price: Decimal,
    /// Free-text clinical notes.
    pub notes: Option<String>,
}

/// Input for one catalog item row.
#[derive(Debug, Clone)]
pub struct NewCatalogItem {
    /// The service definition billed.
    pub definition_id: Uuid,
    /// Units billed.
    pub quantity: i32,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Line total.
    pub total: Decimal,
}

/// Input for one product item row.
#[derive(Debug, Clone)]
pub struct NewProductItem {
    /// The product consumed.
    pub product_id: Uuid,
    /// Units consumed.
    pub quantity: i32,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Line total.
    pub total: Decimal,
}

impl Attendance {
    /// Find an attendance by ID.
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as("SELECT * FROM attendances WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Insert a new attendance row.
    pub async fn insert<'e, E>(executor: E, input: &CreateAttendance) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            r"
            INSERT INTO attendances (animal_id, kind, date, price, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            ",
        )
        .bind(input.animal_id)
        .bind(input.kind)
        .bind(input.date)
        .bind(input.price)
        .bind(&input.notes)
        .fetch_one(executor)
        .await
    }

    /// Update the attendance header fields.
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        kind: AttendanceKind,
        date: NaiveDate,
        price: Decimal,
        notes: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            r"
            UPDATE attendances
            SET kind = $2, date = $3, price = $4, notes = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(kind)
        .bind(date)
        .bind(price)
        .bind(notes)
        .fetch_optional(executor)
        .await
    }
}

impl AttendanceCatalogItem {
    /// Insert one catalog item row.
    pub async fn insert<'e, E>(
        executor: E,
        attendance_id: Uuid,
        item: &NewCatalogItem,
    ) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            r"
            INSERT INTO attendance_catalog_items
                (attendance_id, definition_id, quantity, unit_price, total)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            ",
        )
        .bind(attendance_id)
        .bind(item.definition_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total)
        .fetch_one(executor)
        .await
    }

    /// List the catalog items of an attendance.
    pub async fn list_by_attendance<'e, E>(
        executor: E,
        attendance_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            "SELECT * FROM attendance_catalog_items WHERE attendance_id = $1 ORDER BY id",
        )
        .bind(attendance_id)
        .fetch_all(executor)
        .await
    }

    /// Delete every catalog item of an attendance. Returns the row count.
    pub async fn delete_by_attendance<'e, E>(
        executor: E,
        attendance_id: Uuid,
    ) -> Result<u64, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let result = sqlx::query("DELETE FROM attendance_catalog_items WHERE attendance_id = $1")
            .bind(attendance_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}

impl AttendanceProductItem {
    /// Insert one product item row.
    pub async fn insert<'e, E>(
        executor: E,
        attendance_id: Uuid,
        item: &NewProductItem,
    ) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            r"
            INSERT INTO attendance_product_items
                (attendance_id, product_id, quantity, unit_price, total)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            ",
        )
        .bind(attendance_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total)
        .fetch_one(executor)
        .await
    }

    /// List the product items of an attendance.
    pub async fn list_by_attendance<'e, E>(
        executor: E,
        attendance_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            "SELECT * FROM attendance_product_items WHERE attendance_id = $1 ORDER BY id",
        )
        .bind(attendance_id)
        .fetch_all(executor)
        .await
    }

    /// Delete every product item of an attendance. Returns the row count.
    pub async fn delete_by_attendance<'e, E>(
        executor: E,
        attendance_id: Uuid,
    ) -> Result<u64, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let result = sqlx::query("DELETE FROM attendance_product_items WHERE attendance_id = $1")
            .bind(attendance_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
