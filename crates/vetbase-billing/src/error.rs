//! Error types for the billing core.

use thiserror::Error;
use uuid::Uuid;

/// Result alias for billing operations.
pub type Result<T> = std::result::Result<T, BillingError>;

/// Errors raised by the billing services.
///
/// Everything raised mid-transaction causes a full rollback: the transaction
/// is only committed on the `Ok` path, so no partial stock or invoice state
/// ever lands.
#[derive(Debug, Error)]
pub enum BillingError {
    /// Input rejected before any write happened.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A stock decrement exceeded what is on hand. Names the product and the
    /// quantity actually available so staff can act on it.
    #[error("Insufficient stock for \"{product}\" (available: {available})")]
    InsufficientStock {
        /// Product display name.
        product: String,
        /// Units currently on hand.
        available: i32,
    },

    /// The product exists but is inactive or not sellable.
    #[error("Product \"{product}\" cannot be billed (inactive or not sellable)")]
    ProductNotBillable {
        /// Product display name.
        product: String,
    },

    /// The invoice is paid and therefore immutable.
    #[error("Invoice {0} is paid and cannot be modified")]
    InvoicePaid(Uuid),

    /// Attendance-linked invoice items are owned by the synchronizer and
    /// cannot be removed on their own.
    #[error("Invoice item {0} is derived from an attendance and cannot be removed directly")]
    AttendanceLinkedItem(Uuid),

    /// The installment was already marked paid.
    #[error("Installment {0} is already paid")]
    InstallmentAlreadyPaid(Uuid),

    /// Referenced attendance does not exist.
    #[error("Attendance {0} not found")]
    AttendanceNotFound(Uuid),

    /// Referenced animal does not exist.
    #[error("Animal {0} not found")]
    AnimalNotFound(Uuid),

    /// Referenced product does not exist.
    #[error("Product {0} not found")]
    ProductNotFound(Uuid),

    /// Referenced service definition does not exist.
    #[error("Service definition {0} not found")]
    DefinitionNotFound(Uuid),

    /// Referenced invoice does not exist.
    #[error("Invoice {0} not found")]
    InvoiceNotFound(Uuid),

    /// Referenced invoice item does not exist.
    #[error("Invoice item {0} not found")]
    InvoiceItemNotFound(Uuid),

    /// Referenced installment does not exist.
    #[error("Installment {0} not found")]
    InstallmentNotFound(Uuid),

    /// The invoice status seed rows are missing. This is a deployment or
    /// migration defect, not a user error; callers should alert, not retry.
    #[error("Invoice status seed \"{0}\" is missing; run migrations")]
    InvoiceStatusSeedMissing(&'static str),

    /// Underlying database failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl BillingError {
    /// Whether this error is a business-rule conflict with current state
    /// (as opposed to bad input, missing data, or an infrastructure fault).
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            BillingError::InsufficientStock { .. }
                | BillingError::InvoicePaid(_)
                | BillingError::AttendanceLinkedItem(_)
                | BillingError::InstallmentAlreadyPaid(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_names_product_and_quantity() {
        let err = BillingError::InsufficientStock {
            product: "Flea shampoo".to_string(),
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for \"Flea shampoo\" (available: 3)"
        );
        assert!(err.is_conflict());
    }

    #[test]
    fn test_not_found_is_not_conflict() {
        let err = BillingError::ProductNotFound(Uuid::nil());
        assert!(!err.is_conflict());
    }
}
