//! Invoice synchronization: derive and refresh an invoice from its source
//! attendance.
//!
//! The synchronizer is idempotent. It fully replaces the attendance-linked
//! items on every run instead of appending, so calling it twice with the
//! same attendance state produces no drift, and it never touches manual
//! lines. Paid invoices are frozen: a sync against one returns it unchanged.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use vetbase_db::models::invoice_status::STATUS_OPEN;
use vetbase_db::models::{
    Animal, Attendance, AttendanceCatalogItem, AttendanceProductItem, CreateInvoice, Invoice,
    InvoiceItem, InvoiceStatus, NewInvoiceItem, Product, ServiceDefinition,
};

use crate::error::{BillingError, Result};
use crate::money::round_money;
use crate::services::installments::{reconcile_installments, require_status};

/// Days until an invoice falls due when the caller does not say otherwise.
const DEFAULT_DUE_DAYS: u64 = 7;

/// Optional overrides for a sync run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Explicit due date; defaults to the attendance date plus 7 days on
    /// creation and to the invoice's current due date on refresh.
    pub due_date: Option<NaiveDate>,

    /// Explicit payer; defaults to the animal's tutor on creation and to
    /// the invoice's current payer on refresh.
    pub tutor_id: Option<Uuid>,
}

// ============================================================================
// Pure Business Logic Functions
// ============================================================================

/// Build the derived line set and its subtotal for an attendance.
///
/// One line per catalog item; when there are none, exactly one synthetic
/// line for the attendance itself priced at the attendance's price. Then one
/// line per consumed product. Every derived line carries the attendance
/// link, which is what distinguishes it from manual lines on resync.
pub(crate) fn derive_invoice_lines(
    attendance: &Attendance,
    catalog: &[(AttendanceCatalogItem, String)],
    products: &[(AttendanceProductItem, String)],
) -> (Vec<NewInvoiceItem>, Decimal) {
    let mut lines = Vec::with_capacity(catalog.len().max(1) + products.len());
    let mut subtotal = Decimal::ZERO;

    if catalog.is_empty() {
        let price = round_money(attendance.price);
        lines.push(NewInvoiceItem {
            description: format!("{} ({})", attendance.kind.display_name(), attendance.date),
            quantity: 1,
            unit_price: price,
            total: price,
            attendance_id: Some(attendance.id),
            product_id: None,
        });
        subtotal += price;
    } else {
        for (item, name) in catalog {
            lines.push(NewInvoiceItem {
                description: name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                total: item.total,
                attendance_id: Some(attendance.id),
                product_id: None,
            });
            subtotal += item.total;
        }
    }

    for (item, name) in products {
        lines.push(NewInvoiceItem {
            description: name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            total: item.total,
            attendance_id: Some(attendance.id),
            product_id: Some(item.product_id),
        });
        subtotal += item.total;
    }

    (lines, round_money(subtotal))
}

/// Default due date for a fresh invoice: attendance date + 7 days.
pub(crate) fn default_due_date(attendance_date: NaiveDate) -> NaiveDate {
    attendance_date
        .checked_add_days(Days::new(DEFAULT_DUE_DAYS))
        .unwrap_or(attendance_date)
}

// ============================================================================
// Service
// ============================================================================

/// Service deriving invoices from attendances.
pub struct InvoiceSyncService {
    pool: PgPool,
}

impl InvoiceSyncService {
    /// Create a new synchronizer.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Derive or refresh the invoice backing `attendance_id` in its own
    /// transaction.
    pub async fn sync_invoice_for_attendance(
        &self,
        attendance_id: Uuid,
        options: SyncOptions,
    ) -> Result<Invoice> {
        let mut tx = self.pool.begin().await?;
        let invoice = sync_within(&mut tx, attendance_id, &options).await?;
        tx.commit().await?;
        Ok(invoice)
    }
}

/// Run the synchronization inside an existing transaction. Used by the
/// attendance service so item edits, stock adjustment, and invoice refresh
/// commit or roll back together.
pub async fn sync_within(
    conn: &mut PgConnection,
    attendance_id: Uuid,
    options: &SyncOptions,
) -> Result<Invoice> {
    let attendance = Attendance::find_by_id(&mut *conn, attendance_id)
        .await?
        .ok_or(BillingError::AttendanceNotFound(attendance_id))?;

    let catalog = load_catalog_with_names(&mut *conn, attendance_id).await?;
    let products = load_products_with_names(&mut *conn, attendance_id).await?;

    // Items already linked to this attendance reveal the backing invoice.
    let linked_items = InvoiceItem::list_by_attendance(&mut *conn, attendance_id).await?;
    let existing = match linked_items.first() {
        Some(item) => {
            let invoice = Invoice::find_by_id(&mut *conn, item.invoice_id)
                .await?
                .ok_or(BillingError::InvoiceNotFound(item.invoice_id))?;
            Some(invoice)
        }
        None => None,
    };

    if let Some(ref invoice) = existing {
        let status = InvoiceStatus::find_by_id(&mut *conn, invoice.status_id)
            .await?
            .ok_or(BillingError::InvoiceNotFound(invoice.id))?;
        if status.is_paid() {
            // Paid invoices are terminal; re-syncing one is a no-op.
            tracing::debug!(invoice_id = %invoice.id, "Skipping sync of paid invoice");
            return Ok(invoice.clone());
        }
    }

    let (lines, derived_subtotal) = derive_invoice_lines(&attendance, &catalog, &products);

    let (invoice, due_date) = match existing {
        None => {
            let status = require_status(&mut *conn, STATUS_OPEN).await?;
            let tutor_id = match options.tutor_id {
                Some(tutor_id) => tutor_id,
                None => {
                    Animal::find_by_id(&mut *conn, attendance.animal_id)
                        .await?
                        .ok_or(BillingError::AnimalNotFound(attendance.animal_id))?
                        .tutor_id
                }
            };
            let due_date = options.due_date.unwrap_or_else(|| default_due_date(attendance.date));

            let invoice = Invoice::insert(
                &mut *conn,
                &CreateInvoice {
                    tutor_id,
                    status_id: status.id,
                    total: derived_subtotal,
                    due_date,
                },
            )
            .await?;

            for line in &lines {
                InvoiceItem::insert(&mut *conn, invoice.id, line).await?;
            }

            tracing::info!(
                invoice_id = %invoice.id,
                %attendance_id,
                total = %invoice.total,
                "Invoice created from attendance"
            );
            (invoice, due_date)
        }
        Some(invoice) => {
            // Manual lines that sell a now-consumed product become derived
            // lines instead of duplicating them.
            let consumed: Vec<Uuid> = products.iter().map(|(item, _)| item.product_id).collect();
            if !consumed.is_empty() {
                InvoiceItem::relink_manual_product_items(
                    &mut *conn,
                    invoice.id,
                    attendance_id,
                    &consumed,
                )
                .await?;
            }

            let manual_sum = InvoiceItem::sum_manual_items(&mut *conn, invoice.id).await?;
            let total = round_money(manual_sum + derived_subtotal);

            InvoiceItem::delete_attendance_linked(&mut *conn, invoice.id, attendance_id).await?;
            for line in &lines {
                InvoiceItem::insert(&mut *conn, invoice.id, line).await?;
            }

            let due_date = options.due_date.unwrap_or(invoice.due_date);
            let tutor_id = options.tutor_id.unwrap_or(invoice.tutor_id);
            let invoice = Invoice::update_derived(&mut *conn, invoice.id, total, due_date, tutor_id)
                .await?
                .ok_or(BillingError::InvoiceNotFound(invoice.id))?;

            tracing::info!(
                invoice_id = %invoice.id,
                %attendance_id,
                total = %invoice.total,
                "Invoice refreshed from attendance"
            );
            (invoice, due_date)
        }
    };

    reconcile_installments(&mut *conn, invoice.id, invoice.total, due_date).await?;

    Ok(invoice)
}

async fn load_catalog_with_names(
    conn: &mut PgConnection,
    attendance_id: Uuid,
) -> Result<Vec<(AttendanceCatalogItem, String)>> {
    let items = AttendanceCatalogItem::list_by_attendance(&mut *conn, attendance_id).await?;
    let mut resolved = Vec::with_capacity(items.len());
    for item in items {
        let definition = ServiceDefinition::find_by_id(&mut *conn, item.definition_id)
            .await?
            .ok_or(BillingError::DefinitionNotFound(item.definition_id))?;
        resolved.push((item, definition.name));
    }
    Ok(resolved)
}

async fn load_products_with_names(
    conn: &mut PgConnection,
    attendance_id: Uuid,
) -> Result<Vec<(AttendanceProductItem, String)>> {
    let items = AttendanceProductItem::list_by_attendance(&mut *conn, attendance_id).await?;
    let mut resolved = Vec::with_capacity(items.len());
    for item in items {
        let product = Product::find_by_id(&mut *conn, item.product_id)
            .await?
            .ok_or(BillingError::ProductNotFound(item.product_id))?;
        resolved.push((item, product.name));
    }
    Ok(resolved)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use vetbase_db::models::AttendanceKind;

    fn attendance(price: Decimal) -> Attendance {
        Attendance {
            id: Uuid::new_v4(),
            animal_id: Uuid::new_v4(),
            kind: AttendanceKind::Consultation,
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            price,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn catalog_item(attendance_id: Uuid, quantity: i32, unit: Decimal) -> AttendanceCatalogItem {
        AttendanceCatalogItem {
            id: Uuid::new_v4(),
            attendance_id,
            definition_id: Uuid::new_v4(),
            quantity,
            unit_price: unit,
            total: crate::money::line_total(quantity, unit),
        }
    }

    fn product_item(attendance_id: Uuid, quantity: i32, unit: Decimal) -> AttendanceProductItem {
        AttendanceProductItem {
            id: Uuid::new_v4(),
            attendance_id,
            product_id: Uuid::new_v4(),
            quantity,
            unit_price: unit,
            total: crate::money::line_total(quantity, unit),
        }
    }

    #[test]
    fn test_catalog_items_become_lines() {
        let att = attendance(dec!(100.00));
        let catalog = vec![(catalog_item(att.id, 2, dec!(50.00)), "Consultation".to_string())];

        let (lines, subtotal) = derive_invoice_lines(&att, &catalog, &[]);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].description, "Consultation");
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].total, dec!(100.00));
        assert_eq!(lines[0].attendance_id, Some(att.id));
        assert_eq!(lines[0].product_id, None);
        assert_eq!(subtotal, dec!(100.00));
    }

    #[test]
    fn test_no_catalog_items_yields_one_synthetic_line() {
        let att = attendance(dec!(80.00));

        let (lines, subtotal) = derive_invoice_lines(&att, &[], &[]);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].description, "Consultation (2025-06-02)");
        assert_eq!(lines[0].quantity, 1);
        assert_eq!(lines[0].unit_price, dec!(80.00));
        assert_eq!(lines[0].attendance_id, Some(att.id));
        assert_eq!(subtotal, dec!(80.00));
    }

    #[test]
    fn test_product_lines_carry_product_link_and_add_to_subtotal() {
        let att = attendance(dec!(100.00));
        let catalog = vec![(catalog_item(att.id, 2, dec!(50.00)), "Consultation".to_string())];
        let item = product_item(att.id, 1, dec!(20.00));
        let product_id = item.product_id;
        let products = vec![(item, "Flea shampoo".to_string())];

        let (lines, subtotal) = derive_invoice_lines(&att, &catalog, &products);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].description, "Flea shampoo");
        assert_eq!(lines[1].product_id, Some(product_id));
        assert_eq!(subtotal, dec!(120.00));
    }

    #[test]
    fn test_derivation_is_deterministic() {
        // Idempotence of the full sync reduces to: same inputs, same lines.
        let att = attendance(dec!(100.00));
        let catalog = vec![(catalog_item(att.id, 1, dec!(60.00)), "Exam".to_string())];
        let products = vec![(product_item(att.id, 3, dec!(5.50)), "Bandage".to_string())];

        let (first, first_subtotal) = derive_invoice_lines(&att, &catalog, &products);
        let (second, second_subtotal) = derive_invoice_lines(&att, &catalog, &products);

        assert_eq!(first_subtotal, second_subtotal);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.description, b.description);
            assert_eq!(a.total, b.total);
        }
    }

    #[test]
    fn test_default_due_date_is_one_week_out() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        assert_eq!(default_due_date(date), NaiveDate::from_ymd_opt(2025, 6, 9).unwrap());
    }
}
