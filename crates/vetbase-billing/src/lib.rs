//! Billing core for the vetbase back office.
//!
//! Four tightly coupled pieces keep the money and the stock consistent:
//!
//! - the [`ledger`]: the only writer of product stock, built on conditional
//!   row updates so stock can never go negative;
//! - the invoice synchronizer ([`services::invoice_sync`]): idempotent
//!   derivation of an invoice from an attendance, preserving manual lines;
//! - the installment reconciler ([`services::installments`]): keeps
//!   `sum(installment.amount)` exactly equal to the invoice total;
//! - manual item mutation ([`services::invoice_items`]) and attendance
//!   create/edit ([`services::attendance`]), which tie the above together
//!   inside single transactions.
//!
//! All monetary arithmetic uses `rust_decimal::Decimal` rounded to two
//! decimal places at computation points ([`money`]).

pub mod error;
pub mod ledger;
pub mod money;
pub mod services;

pub use error::{BillingError, Result};
pub use services::{
    AttendanceInput, AttendanceService, CatalogLineInput, InstallmentService, InvoiceItemService,
    InvoiceSyncService, ManualItemInput, ProductLineInput, SyncOptions,
};
