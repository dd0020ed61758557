//! Installment reconciliation and payment registration.
//!
//! The reconciler is the single source of truth for the invariant
//! `sum(installment.amount) == invoice.total`. Every total change funnels
//! through [`reconcile_installments`] inside the caller's transaction.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use vetbase_db::models::invoice_status::{STATUS_OPEN, STATUS_PAID, STATUS_PARTIALLY_PAID};
use vetbase_db::models::{Invoice, InvoiceInstallment, InvoiceStatus, NewInstallment};

use crate::error::{BillingError, Result};
use crate::money::round_money;

// ============================================================================
// Pure Business Logic Functions
// ============================================================================

/// What the reconciler decided to do for one invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReconcilePlan {
    /// No installments exist: create a single one for the full total.
    CreateSingle {
        /// Amount of the new installment.
        amount: Decimal,
    },
    /// Installments exist and their sum drifted from the total: absorb the
    /// whole difference into the last installment (by due-date order) so
    /// already-communicated earlier amounts stay stable.
    AdjustLast {
        /// The installment to rewrite.
        installment_id: Uuid,
        /// Its corrected amount.
        new_amount: Decimal,
    },
    /// Amounts already sum to the total.
    Unchanged,
}

/// Decide how to bring `existing` (ordered by due date ascending) in line
/// with `total`.
pub(crate) fn plan_reconciliation(
    existing: &[InvoiceInstallment],
    total: Decimal,
) -> ReconcilePlan {
    let total = round_money(total);

    let Some(last) = existing.last() else {
        return ReconcilePlan::CreateSingle { amount: total };
    };

    let sum: Decimal = existing.iter().map(|i| i.amount).sum();
    let difference = round_money(total - sum);

    if difference.is_zero() {
        ReconcilePlan::Unchanged
    } else {
        ReconcilePlan::AdjustLast {
            installment_id: last.id,
            new_amount: round_money(last.amount + difference),
        }
    }
}

/// Which status slug an invoice should carry given its installment payment
/// counts.
pub(crate) fn derive_status_slug(paid: i64, unpaid: i64) -> &'static str {
    if unpaid == 0 && paid > 0 {
        STATUS_PAID
    } else if paid > 0 {
        STATUS_PARTIALLY_PAID
    } else {
        STATUS_OPEN
    }
}

// ============================================================================
// Reconciler
// ============================================================================

/// Ensure the installments of `invoice_id` sum exactly to `total`.
///
/// Runs inside the caller's transaction. With no installments, a single one
/// for the full amount is created due on `fallback_due_date`; otherwise the
/// difference is folded into the last installment.
pub async fn reconcile_installments(
    conn: &mut PgConnection,
    invoice_id: Uuid,
    total: Decimal,
    fallback_due_date: NaiveDate,
) -> Result<()> {
    let existing = InvoiceInstallment::list_by_invoice(&mut *conn, invoice_id).await?;

    match plan_reconciliation(&existing, total) {
        ReconcilePlan::CreateSingle { amount } => {
            InvoiceInstallment::insert(
                &mut *conn,
                invoice_id,
                &NewInstallment {
                    due_date: fallback_due_date,
                    amount,
                },
            )
            .await?;
            tracing::info!(%invoice_id, %amount, "Created default installment");
        }
        ReconcilePlan::AdjustLast {
            installment_id,
            new_amount,
        } => {
            if !InvoiceInstallment::update_amount(&mut *conn, installment_id, new_amount).await? {
                return Err(BillingError::InstallmentNotFound(installment_id));
            }
            tracing::info!(%invoice_id, %installment_id, %new_amount, "Adjusted last installment");
        }
        ReconcilePlan::Unchanged => {}
    }

    Ok(())
}

/// Resolve a status row by slug, treating a missing seed as fatal.
pub(crate) async fn require_status(
    conn: &mut PgConnection,
    slug: &'static str,
) -> Result<InvoiceStatus> {
    match InvoiceStatus::find_by_slug(&mut *conn, slug).await? {
        Some(status) => Ok(status),
        None => {
            tracing::error!(slug, "Invoice status seed missing; database not migrated?");
            Err(BillingError::InvoiceStatusSeedMissing(slug))
        }
    }
}

// ============================================================================
// Service
// ============================================================================

/// Service for installment payment registration.
pub struct InstallmentService {
    pool: PgPool,
}

impl InstallmentService {
    /// Create a new installment service.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a payment on one installment and derive the invoice status:
    /// all installments paid moves the invoice to `paid` (terminal, with
    /// `paid_at` stamped); at least one paid moves it to `partially_paid`.
    pub async fn register_payment(&self, installment_id: Uuid) -> Result<Invoice> {
        let mut tx = self.pool.begin().await?;

        let installment = InvoiceInstallment::find_by_id(&mut *tx, installment_id)
            .await?
            .ok_or(BillingError::InstallmentNotFound(installment_id))?;

        let invoice = Invoice::find_by_id(&mut *tx, installment.invoice_id)
            .await?
            .ok_or(BillingError::InvoiceNotFound(installment.invoice_id))?;

        let now = Utc::now();
        if !InvoiceInstallment::mark_paid(&mut *tx, installment_id, now).await? {
            return Err(BillingError::InstallmentAlreadyPaid(installment_id));
        }

        let (paid, unpaid) =
            InvoiceInstallment::count_paid_unpaid(&mut *tx, invoice.id).await?;
        let slug = derive_status_slug(paid, unpaid);
        let status = require_status(&mut tx, slug).await?;
        let paid_at = if slug == STATUS_PAID { Some(now) } else { None };

        let invoice = Invoice::set_status(&mut *tx, invoice.id, status.id, paid_at)
            .await?
            .ok_or(BillingError::InvoiceNotFound(invoice.id))?;

        tx.commit().await?;

        tracing::info!(
            invoice_id = %invoice.id,
            %installment_id,
            status = slug,
            "Installment payment registered"
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
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn installment(amount: Decimal, due: NaiveDate) -> InvoiceInstallment {
        InvoiceInstallment {
            id: Uuid::new_v4(),
            invoice_id: Uuid::new_v4(),
            due_date: due,
            amount,
            paid_at: None,
            created_at: Utc::now(),
        }
    }

    fn due(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[test]
    fn test_no_installments_creates_single_full_amount() {
        let plan = plan_reconciliation(&[], dec!(100.00));
        assert_eq!(
            plan,
            ReconcilePlan::CreateSingle {
                amount: dec!(100.00)
            }
        );
    }

    #[test]
    fn test_difference_goes_entirely_to_last_installment() {
        let first = installment(dec!(50.00), due(1));
        let last = installment(dec!(50.00), due(15));
        let last_id = last.id;

        let plan = plan_reconciliation(&[first, last], dec!(120.00));
        assert_eq!(
            plan,
            ReconcilePlan::AdjustLast {
                installment_id: last_id,
                new_amount: dec!(70.00)
            }
        );
    }

    #[test]
    fn test_negative_difference_shrinks_last_installment() {
        let first = installment(dec!(60.00), due(1));
        let last = installment(dec!(60.00), due(15));
        let last_id = last.id;

        let plan = plan_reconciliation(&[first, last], dec!(100.00));
        assert_eq!(
            plan,
            ReconcilePlan::AdjustLast {
                installment_id: last_id,
                new_amount: dec!(40.00)
            }
        );
    }

    #[test]
    fn test_matching_sum_is_unchanged() {
        let rows = vec![installment(dec!(30.00), due(1)), installment(dec!(70.00), due(15))];
        assert_eq!(plan_reconciliation(&rows, dec!(100.00)), ReconcilePlan::Unchanged);
    }

    #[test]
    fn test_plan_preserves_exact_decimal_equality() {
        // Three-way split with a repeating decimal: the last row absorbs the
        // odd cent so the sum matches the total exactly.
        let rows = vec![
            installment(dec!(33.33), due(1)),
            installment(dec!(33.33), due(15)),
            installment(dec!(33.33), due(30)),
        ];
        let last_id = rows[2].id;
        let plan = plan_reconciliation(&rows, dec!(100.00));
        assert_eq!(
            plan,
            ReconcilePlan::AdjustLast {
                installment_id: last_id,
                new_amount: dec!(33.34)
            }
        );
    }

    #[test]
    fn test_single_installment_absorbs_total_change() {
        // Scenario: invoice resynced from 100.00 to 120.00 with one
        // installment; its amount becomes 120.00.
        let only = installment(dec!(100.00), due(1));
        let only_id = only.id;
        let plan = plan_reconciliation(&[only], dec!(120.00));
        assert_eq!(
            plan,
            ReconcilePlan::AdjustLast {
                installment_id: only_id,
                new_amount: dec!(120.00)
            }
        );
    }

    #[test]
    fn test_status_slug_derivation() {
        assert_eq!(derive_status_slug(0, 3), STATUS_OPEN);
        assert_eq!(derive_status_slug(1, 2), STATUS_PARTIALLY_PAID);
        assert_eq!(derive_status_slug(3, 0), STATUS_PAID);
        // An invoice with no installments at all stays open.
        assert_eq!(derive_status_slug(0, 0), STATUS_OPEN);
    }
}
