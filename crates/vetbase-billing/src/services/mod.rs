//! Billing services.
//!
//! Each service holds the injected `PgPool`, opens one transaction per
//! logical operation, and commits only on the success path.

pub mod attendance;
pub mod installments;
pub mod invoice_items;
pub mod invoice_sync;

pub use attendance::{AttendanceInput, AttendanceService, CatalogLineInput, ProductLineInput};
pub use installments::{reconcile_installments, InstallmentService};
pub use invoice_items::{InvoiceItemService, ManualItemInput};
pub use invoice_sync::{sync_within, InvoiceSyncService, SyncOptions};
