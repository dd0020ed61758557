//! Connection pool wrapper.
//!
//! The pool is created once by the composition root from a [`DbConfig`] and
//! injected into every service; its lifecycle (open at process start, closed
//! at shutdown) belongs to the caller, never to module-level state.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DbConfig;
use crate::error::DbError;

/// A handle to the PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct DbPool {
    inner: PgPool,
}

impl DbPool {
    /// Connect to the database described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::ConnectionFailed`] if the pool cannot be established.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        let inner = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(DbError::ConnectionFailed)?;

        tracing::info!(
            max_connections = config.max_connections,
            "Database pool established"
        );

        Ok(Self { inner })
    }

    /// Wrap an existing `PgPool` (used by tests).
    #[must_use]
    pub fn from_pool(inner: PgPool) -> Self {
        Self { inner }
    }

    /// Access the underlying `sqlx` pool.
    #[must_use]
    pub fn inner(&self) -> &PgPool {
        &self.inner
    }

    /// Close the pool, waiting for in-flight connections to finish.
    pub async fn close(&self) {
        self.inner.close().await;
        tracing::info!("Database pool closed");
    }
}
