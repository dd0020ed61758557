//! Manual invoice item mutation.
//!
//! Manual lines (no attendance link) are added and removed directly on the
//! invoice; the total is recomputed as a straight re-aggregation of the
//! current items, which is deliberately distinct from the synchronizer's
//! derivation. Product-linked lines move stock both ways.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use vetbase_db::models::{Invoice, InvoiceItem, InvoiceStatus, NewInvoiceItem, Product};

use crate::error::{BillingError, Result};
use crate::ledger;
use crate::money::line_total;
use crate::services::installments::reconcile_installments;

/// Input for a manually added invoice line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualItemInput {
    /// Line description; defaults to the product name when product-linked.
    pub description: Option<String>,
    /// Units billed.
    pub quantity: i32,
    /// Price per unit; defaults to the product's sale price when
    /// product-linked.
    pub unit_price: Option<Decimal>,
    /// Product sold by this line, if any.
    pub product_id: Option<Uuid>,
}

// ============================================================================
// Pure Business Logic Functions
// ============================================================================

/// Resolve a manual input to a concrete item row, applying product defaults
/// and validating what can be validated without touching stock.
pub(crate) fn resolve_manual_line(
    input: &ManualItemInput,
    product: Option<&Product>,
) -> Result<NewInvoiceItem> {
    if input.quantity <= 0 {
        return Err(BillingError::Validation(
            "Item quantity must be positive".to_string(),
        ));
    }

    let (description, unit_price, product_id) = match product {
        Some(product) => {
            if !product.is_billable() {
                return Err(BillingError::ProductNotBillable {
                    product: product.name.clone(),
                });
            }
            (
                input.description.clone().unwrap_or_else(|| product.name.clone()),
                input.unit_price.unwrap_or(product.sale_price),
                Some(product.id),
            )
        }
        None => {
            let description = input.description.clone().ok_or_else(|| {
                BillingError::Validation(
                    "A description is required for items without a product".to_string(),
                )
            })?;
            let unit_price = input.unit_price.ok_or_else(|| {
                BillingError::Validation(
                    "A unit price is required for items without a product".to_string(),
                )
            })?;
            (description, unit_price, None)
        }
    };

    Ok(NewInvoiceItem {
        description,
        quantity: input.quantity,
        unit_price,
        total: line_total(input.quantity, unit_price),
        attendance_id: None,
        product_id,
    })
}

/// Fail when the invoice's status is the terminal paid slug.
pub(crate) async fn ensure_not_paid(
    conn: &mut PgConnection,
    invoice: &Invoice,
) -> Result<()> {
    let status = InvoiceStatus::find_by_id(&mut *conn, invoice.status_id)
        .await?
        .ok_or(BillingError::InvoiceNotFound(invoice.id))?;
    if status.is_paid() {
        return Err(BillingError::InvoicePaid(invoice.id));
    }
    Ok(())
}

// ============================================================================
// Service
// ============================================================================

/// Service for manual invoice item mutation.
pub struct InvoiceItemService {
    pool: PgPool,
}

impl InvoiceItemService {
    /// Create a new invoice item service.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add a manual line to an open invoice. Product-linked lines consume
    /// stock inside the same transaction; the invoice total and installments
    /// are brought back in line before committing.
    pub async fn add_manual_item(
        &self,
        invoice_id: Uuid,
        input: ManualItemInput,
    ) -> Result<InvoiceItem> {
        let mut tx = self.pool.begin().await?;

        let invoice = Invoice::find_by_id(&mut *tx, invoice_id)
            .await?
            .ok_or(BillingError::InvoiceNotFound(invoice_id))?;
        ensure_not_paid(&mut tx, &invoice).await?;

        let product = match input.product_id {
            Some(product_id) => Some(
                Product::find_by_id(&mut *tx, product_id)
                    .await?
                    .ok_or(BillingError::ProductNotFound(product_id))?,
            ),
            None => None,
        };

        let line = resolve_manual_line(&input, product.as_ref())?;

        if let Some(product_id) = line.product_id {
            ledger::decrement(&mut tx, product_id, line.quantity).await?;
        }

        let item = InvoiceItem::insert(&mut *tx, invoice_id, &line).await?;
        let total = Invoice::recompute_total_from_items(&mut *tx, invoice_id).await?;
        reconcile_installments(&mut tx, invoice_id, total, invoice.due_date).await?;

        tx.commit().await?;

        tracing::info!(
            %invoice_id,
            item_id = %item.id,
            %total,
            "Manual invoice item added"
        );

        Ok(item)
    }

    /// Remove a manual line from an open invoice. Attendance-linked lines
    /// are refused; product-linked removals restore stock.
    pub async fn remove_item(&self, item_id: Uuid) -> Result<Invoice> {
        let mut tx = self.pool.begin().await?;

        let item = InvoiceItem::find_by_id(&mut *tx, item_id)
            .await?
            .ok_or(BillingError::InvoiceItemNotFound(item_id))?;

        let invoice = Invoice::find_by_id(&mut *tx, item.invoice_id)
            .await?
            .ok_or(BillingError::InvoiceNotFound(item.invoice_id))?;
        ensure_not_paid(&mut tx, &invoice).await?;

        if item.is_attendance_linked() {
            return Err(BillingError::AttendanceLinkedItem(item_id));
        }

        if let Some(product_id) = item.product_id {
            ledger::increment(&mut tx, product_id, item.quantity).await?;
        }

        InvoiceItem::delete(&mut *tx, item_id).await?;
        let total = Invoice::recompute_total_from_items(&mut *tx, invoice.id).await?;
        reconcile_installments(&mut tx, invoice.id, total, invoice.due_date).await?;

        let invoice = Invoice::find_by_id(&mut *tx, invoice.id)
            .await?
            .ok_or(BillingError::InvoiceNotFound(invoice.id))?;

        tx.commit().await?;

        tracing::info!(
            invoice_id = %invoice.id,
            %item_id,
            total = %invoice.total,
            "Manual invoice item removed"
        );

        Ok(invoice)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn product(name: &str, sellable: bool, active: bool) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            stock: 10,
            min_stock: 2,
            sellable,
            active,
            cost_price: dec!(8.00),
            sale_price: dec!(15.00),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_freeform_line_requires_description_and_price() {
        let input = ManualItemInput {
            description: None,
            quantity: 1,
            unit_price: Some(dec!(15.00)),
            product_id: None,
        };
        assert!(matches!(
            resolve_manual_line(&input, None),
            Err(BillingError::Validation(_))
        ));

        let input = ManualItemInput {
            description: Some("Late fee".to_string()),
            quantity: 1,
            unit_price: None,
            product_id: None,
        };
        assert!(matches!(
            resolve_manual_line(&input, None),
            Err(BillingError::Validation(_))
        ));
    }

    #[test]
    fn test_product_line_defaults_from_product() {
        let product = product("Dewormer", true, true);
        let input = ManualItemInput {
            description: None,
            quantity: 2,
            unit_price: None,
            product_id: Some(product.id),
        };

        let line = resolve_manual_line(&input, Some(&product)).unwrap();
        assert_eq!(line.description, "Dewormer");
        assert_eq!(line.unit_price, dec!(15.00));
        assert_eq!(line.total, dec!(30.00));
        assert_eq!(line.product_id, Some(product.id));
        assert_eq!(line.attendance_id, None);
    }

    #[test]
    fn test_unsellable_or_inactive_product_is_rejected() {
        for (sellable, active) in [(false, true), (true, false)] {
            let product = product("Rx only", sellable, active);
            let input = ManualItemInput {
                description: None,
                quantity: 1,
                unit_price: None,
                product_id: Some(product.id),
            };
            assert!(matches!(
                resolve_manual_line(&input, Some(&product)),
                Err(BillingError::ProductNotBillable { .. })
            ));
        }
    }

    #[test]
    fn test_non_positive_quantity_is_rejected() {
        let input = ManualItemInput {
            description: Some("Late fee".to_string()),
            quantity: 0,
            unit_price: Some(dec!(5.00)),
            product_id: None,
        };
        assert!(matches!(
            resolve_manual_line(&input, None),
            Err(BillingError::Validation(_))
        ));
    }
}
