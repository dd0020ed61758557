//! Attendance create/edit: the entry point that ties item lists, stock
//! adjustment, and invoice synchronization into one transaction.
//!
//! Editing replaces the item lists wholesale. Stock is handled in two
//! phases: restore everything the attendance previously consumed, then
//! apply the new demands through conditional decrements. A shortfall on any
//! product aborts the transaction, rolling back the restores with it.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use vetbase_db::models::{
    Animal, Attendance, AttendanceCatalogItem, AttendanceKind, AttendanceProductItem,
    CreateAttendance, Invoice, InvoiceItem, NewCatalogItem, NewProductItem, Product,
    ServiceDefinition,
};

use crate::error::{BillingError, Result};
use crate::ledger::{self, StockDemand};
use crate::money::{line_total, round_money};
use crate::services::invoice_items::ensure_not_paid;
use crate::services::invoice_sync::{sync_within, SyncOptions};

/// One requested catalog line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogLineInput {
    /// The service definition billed.
    pub definition_id: Uuid,
    /// Units billed.
    pub quantity: i32,
    /// Price per unit; defaults to the definition's price.
    pub unit_price: Option<Decimal>,
}

/// One requested product line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductLineInput {
    /// The product consumed.
    pub product_id: Uuid,
    /// Units consumed.
    pub quantity: i32,
    /// Price per unit; defaults to the product's sale price.
    pub unit_price: Option<Decimal>,
}

/// Input for creating or replacing an attendance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceInput {
    /// The animal seen.
    pub animal_id: Uuid,
    /// Kind of visit.
    pub kind: AttendanceKind,
    /// Date of the visit.
    pub date: NaiveDate,
    /// Explicit price; when absent the price is the sum of catalog totals.
    pub price: Option<Decimal>,
    /// Free-text clinical notes.
    pub notes: Option<String>,
    /// Catalog lines; at most one per definition.
    pub catalog_items: Vec<CatalogLineInput>,
    /// Product lines; at most one per product.
    pub product_items: Vec<ProductLineInput>,
}

// ============================================================================
// Pure Business Logic Functions
// ============================================================================

/// Reject duplicate references and non-positive quantities before anything
/// is written. The schema layer upstream de-duplicates too; this is the
/// second line of defense.
pub(crate) fn validate_item_lists(input: &AttendanceInput) -> Result<()> {
    let mut seen_definitions = std::collections::HashSet::new();
    for line in &input.catalog_items {
        if line.quantity <= 0 {
            return Err(BillingError::Validation(
                "Catalog item quantity must be positive".to_string(),
            ));
        }
        if !seen_definitions.insert(line.definition_id) {
            return Err(BillingError::Validation(format!(
                "Service definition {} appears more than once; use the quantity instead",
                line.definition_id
            )));
        }
    }

    let mut seen_products = std::collections::HashSet::new();
    for line in &input.product_items {
        if line.quantity <= 0 {
            return Err(BillingError::Validation(
                "Product item quantity must be positive".to_string(),
            ));
        }
        if !seen_products.insert(line.product_id) {
            return Err(BillingError::Validation(format!(
                "Product {} appears more than once; use the quantity instead",
                line.product_id
            )));
        }
    }

    Ok(())
}

/// The attendance price: explicit when given, otherwise the sum of catalog
/// line totals.
pub(crate) fn resolve_price(explicit: Option<Decimal>, catalog_sum: Decimal) -> Decimal {
    round_money(explicit.unwrap_or(catalog_sum))
}

// ============================================================================
// Service
// ============================================================================

/// Service for creating and editing attendances.
pub struct AttendanceService {
    pool: PgPool,
}

impl AttendanceService {
    /// Create a new attendance service.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an attendance with its items, consume stock for the product
    /// lines, and derive its invoice, all in one transaction.
    pub async fn create(&self, input: AttendanceInput) -> Result<(Attendance, Invoice)> {
        validate_item_lists(&input)?;

        let mut tx = self.pool.begin().await?;

        Animal::find_by_id(&mut *tx, input.animal_id)
            .await?
            .ok_or(BillingError::AnimalNotFound(input.animal_id))?;

        let catalog_rows = resolve_catalog_lines(&mut tx, &input.catalog_items).await?;
        let product_rows = resolve_product_lines(&mut tx, &input.product_items).await?;

        let catalog_sum: Decimal = catalog_rows.iter().map(|r| r.total).sum();
        let price = resolve_price(input.price, catalog_sum);

        let attendance = Attendance::insert(
            &mut *tx,
            &CreateAttendance {
                animal_id: input.animal_id,
                kind: input.kind,
                date: input.date,
                price,
                notes: input.notes.clone(),
            },
        )
        .await?;

        for row in &catalog_rows {
            AttendanceCatalogItem::insert(&mut *tx, attendance.id, row).await?;
        }
        for row in &product_rows {
            AttendanceProductItem::insert(&mut *tx, attendance.id, row).await?;
        }

        let demands: Vec<StockDemand> = product_rows
            .iter()
            .map(|r| StockDemand {
                product_id: r.product_id,
                quantity: r.quantity,
            })
            .collect();
        ledger::consume(&mut tx, &demands).await?;

        let invoice = sync_within(&mut tx, attendance.id, &SyncOptions::default()).await?;

        tx.commit().await?;

        tracing::info!(
            attendance_id = %attendance.id,
            invoice_id = %invoice.id,
            price = %attendance.price,
            "Attendance created"
        );

        Ok((attendance, invoice))
    }

    /// Replace an attendance's header and item lists, re-settling stock and
    /// re-deriving the invoice, all in one transaction. Refused once the
    /// linked invoice is paid.
    pub async fn update(&self, id: Uuid, input: AttendanceInput) -> Result<(Attendance, Invoice)> {
        validate_item_lists(&input)?;

        let mut tx = self.pool.begin().await?;

        let attendance = Attendance::find_by_id(&mut *tx, id)
            .await?
            .ok_or(BillingError::AttendanceNotFound(id))?;

        // Financial edits are blocked once the backing invoice is paid.
        let linked = InvoiceItem::list_by_attendance(&mut *tx, attendance.id).await?;
        if let Some(item) = linked.first() {
            let invoice = Invoice::find_by_id(&mut *tx, item.invoice_id)
                .await?
                .ok_or(BillingError::InvoiceNotFound(item.invoice_id))?;
            ensure_not_paid(&mut tx, &invoice).await?;
        }

        // Phase one: put back everything the attendance had consumed, so the
        // new list validates against restored stock levels.
        let previous = AttendanceProductItem::list_by_attendance(&mut *tx, attendance.id).await?;
        ledger::restore(&mut tx, &previous).await?;

        AttendanceCatalogItem::delete_by_attendance(&mut *tx, attendance.id).await?;
        AttendanceProductItem::delete_by_attendance(&mut *tx, attendance.id).await?;

        let catalog_rows = resolve_catalog_lines(&mut tx, &input.catalog_items).await?;
        let product_rows = resolve_product_lines(&mut tx, &input.product_items).await?;

        let catalog_sum: Decimal = catalog_rows.iter().map(|r| r.total).sum();
        let price = resolve_price(input.price, catalog_sum);

        let attendance = Attendance::update(
            &mut *tx,
            attendance.id,
            input.kind,
            input.date,
            price,
            input.notes.as_deref(),
        )
        .await?
        .ok_or(BillingError::AttendanceNotFound(id))?;

        for row in &catalog_rows {
            AttendanceCatalogItem::insert(&mut *tx, attendance.id, row).await?;
        }
        for row in &product_rows {
            AttendanceProductItem::insert(&mut *tx, attendance.id, row).await?;
        }

        // Phase two: apply the new demands; the conditional decrement fails
        // fast with the offending product on any shortfall.
        let demands: Vec<StockDemand> = product_rows
            .iter()
            .map(|r| StockDemand {
                product_id: r.product_id,
                quantity: r.quantity,
            })
            .collect();
        ledger::consume(&mut tx, &demands).await?;

        let invoice = sync_within(&mut tx, attendance.id, &SyncOptions::default()).await?;

        tx.commit().await?;

        tracing::info!(
            attendance_id = %attendance.id,
            invoice_id = %invoice.id,
            price = %attendance.price,
            "Attendance updated"
        );

        Ok((attendance, invoice))
    }
}

async fn resolve_catalog_lines(
    conn: &mut sqlx::PgConnection,
    lines: &[CatalogLineInput],
) -> Result<Vec<NewCatalogItem>> {
    let mut rows = Vec::with_capacity(lines.len());
    for line in lines {
        let definition = ServiceDefinition::find_by_id(&mut *conn, line.definition_id)
            .await?
            .ok_or(BillingError::DefinitionNotFound(line.definition_id))?;
        let unit_price = line.unit_price.unwrap_or(definition.default_price);
        rows.push(NewCatalogItem {
            definition_id: definition.id,
            quantity: line.quantity,
            unit_price,
            total: line_total(line.quantity, unit_price),
        });
    }
    Ok(rows)
}

async fn resolve_product_lines(
    conn: &mut sqlx::PgConnection,
    lines: &[ProductLineInput],
) -> Result<Vec<NewProductItem>> {
    let mut rows = Vec::with_capacity(lines.len());
    for line in lines {
        let product = Product::find_by_id(&mut *conn, line.product_id)
            .await?
            .ok_or(BillingError::ProductNotFound(line.product_id))?;
        if !product.is_billable() {
            return Err(BillingError::ProductNotBillable {
                product: product.name,
            });
        }
        let unit_price = line.unit_price.unwrap_or(product.sale_price);
        rows.push(NewProductItem {
            product_id: product.id,
            quantity: line.quantity,
            unit_price,
            total: line_total(line.quantity, unit_price),
        });
    }
    Ok(rows)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_input() -> AttendanceInput {
        AttendanceInput {
            animal_id: Uuid::new_v4(),
            kind: AttendanceKind::Consultation,
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            price: None,
            notes: None,
            catalog_items: Vec::new(),
            product_items: Vec::new(),
        }
    }

    #[test]
    fn test_duplicate_definition_is_rejected() {
        let definition_id = Uuid::new_v4();
        let mut input = base_input();
        input.catalog_items = vec![
            CatalogLineInput {
                definition_id,
                quantity: 1,
                unit_price: None,
            },
            CatalogLineInput {
                definition_id,
                quantity: 2,
                unit_price: None,
            },
        ];
        assert!(matches!(
            validate_item_lists(&input),
            Err(BillingError::Validation(_))
        ));
    }

    #[test]
    fn test_duplicate_product_is_rejected() {
        let product_id = Uuid::new_v4();
        let mut input = base_input();
        input.product_items = vec![
            ProductLineInput {
                product_id,
                quantity: 1,
                unit_price: None,
            },
            ProductLineInput {
                product_id,
                quantity: 1,
                unit_price: None,
            },
        ];
        assert!(matches!(
            validate_item_lists(&input),
            Err(BillingError::Validation(_))
        ));
    }

    #[test]
    fn test_zero_quantity_is_rejected() {
        let mut input = base_input();
        input.product_items = vec![ProductLineInput {
            product_id: Uuid::new_v4(),
            quantity: 0,
            unit_price: None,
        }];
        assert!(validate_item_lists(&input).is_err());
    }

    #[test]
    fn test_distinct_lines_pass_validation() {
        let mut input = base_input();
        input.catalog_items = vec![CatalogLineInput {
            definition_id: Uuid::new_v4(),
            quantity: 2,
            unit_price: Some(dec!(50.00)),
        }];
        input.product_items = vec![ProductLineInput {
            product_id: Uuid::new_v4(),
            quantity: 1,
            unit_price: None,
        }];
        assert!(validate_item_lists(&input).is_ok());
    }

    #[test]
    fn test_price_defaults_to_catalog_sum() {
        assert_eq!(resolve_price(None, dec!(100.00)), dec!(100.00));
        assert_eq!(resolve_price(Some(dec!(85.00)), dec!(100.00)), dec!(85.00));
    }
}
