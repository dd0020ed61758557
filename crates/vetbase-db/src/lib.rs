//! vetbase PostgreSQL persistence layer.
//!
//! One model module per table, in the style of a thin data-access layer:
//! `FromRow` structs, `Create*` input structs, and async functions that take
//! either a pool or a transaction-capable executor. Statements that must run
//! inside a caller's transaction (stock adjustment, invoice item
//! replacement, installment reconciliation) are generic over
//! `sqlx::Executor` so services can pass `&mut *tx`.
//!
//! # Modules
//!
//! - [`config`] - Environment-driven pool configuration (fail-fast)
//! - [`pool`] - `DbPool` wrapper owned by the composition root
//! - [`migrations`] - Embedded versioned migrations
//! - [`models`] - Table models
//! - [`error`] - `DbError`

pub mod config;
pub mod error;
pub mod migrations;
pub mod models;
pub mod pool;

pub use config::{ConfigError, DbConfig};
pub use error::DbError;
pub use migrations::run_migrations;
pub use pool::DbPool;
