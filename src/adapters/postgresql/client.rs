//! PostgreSQL client implementation
//!
//! This module provides the pooled client used by the PostgreSQL store.

use crate::config::schema::PostgreSQLConfig;
use crate::domain::StoreError;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::{NoTls, Row};

type StoreResult<T> = std::result::Result<T, StoreError>;

/// Pooled PostgreSQL client
///
/// Provides connection handling, schema setup and plain statement helpers.
pub struct PostgreSQLClient {
    /// Connection pool
    pool: Pool,

    /// Configuration
    config: PostgreSQLConfig,
}

impl PostgreSQLClient {
    /// Create a new PostgreSQL client
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string is invalid or the pool
    /// cannot be built.
    pub async fn new(config: PostgreSQLConfig) -> StoreResult<Self> {
        let pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .parse()
            .map_err(|e| {
                StoreError::ConnectionFailed(format!("Invalid PostgreSQL connection string: {e}"))
            })?;

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let manager = Manager::from_config(pg_config, NoTls, manager_config);
        let timeout = Duration::from_secs(config.connection_timeout_seconds);

        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .wait_timeout(Some(timeout))
            .create_timeout(Some(timeout))
            .recycle_timeout(Some(timeout))
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| {
                StoreError::ConnectionFailed(format!("Failed to create connection pool: {e}"))
            })?;

        Ok(Self { pool, config })
    }

    /// Test the connection to PostgreSQL
    pub async fn test_connection(&self) -> StoreResult<()> {
        let client = self.get_connection().await?;

        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| StoreError::ConnectionFailed(format!("Connection test failed: {e}")))?;

        tracing::info!("PostgreSQL connection test successful");
        Ok(())
    }

    /// Run the schema migration
    ///
    /// Every statement is guarded, so this is safe to call on each start.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        let client = self.get_connection().await?;

        let migration_sql = include_str!("../../../migrations/001_initial_schema.sql");

        client
            .batch_execute(migration_sql)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Failed to execute migration: {e}")))?;

        tracing::debug!("PostgreSQL schema initialized");
        Ok(())
    }

    /// Get a connection from the pool with the statement timeout applied
    pub async fn get_connection(&self) -> StoreResult<deadpool_postgres::Object> {
        let client = self.pool.get().await.map_err(|e| {
            StoreError::ConnectionFailed(format!("Failed to get connection from pool: {e}"))
        })?;

        client
            .execute(&self.statement_timeout_sql(), &[])
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Failed to set statement timeout: {e}")))?;

        Ok(client)
    }

    /// Execute a query and return rows
    pub async fn query(
        &self,
        query: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> StoreResult<Vec<Row>> {
        let client = self.get_connection().await?;

        client
            .query(query, params)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))
    }

    /// Execute a statement and return the number of affected rows
    pub async fn execute(
        &self,
        statement: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> StoreResult<u64> {
        let client = self.get_connection().await?;

        client
            .execute(statement, params)
            .await
            .map_err(|e| StoreError::WriteFailed(e.to_string()))
    }

    fn statement_timeout_sql(&self) -> String {
        format!(
            "SET statement_timeout = {}",
            self.config.statement_timeout_seconds * 1000
        )
    }

    /// Connection string with the credentials redacted
    pub fn connection_string_safe(&self) -> String {
        redact_connection_string(self.config.connection_string.expose_secret().as_ref())
    }

    /// Get the pool statistics
    pub fn pool_status(&self) -> deadpool_postgres::Status {
        self.pool.status()
    }
}

/// Replaces everything before the host part of a connection URL
pub(crate) fn redact_connection_string(conn: &str) -> String {
    match conn.rsplit_once('@') {
        Some((_, host)) => format!("postgresql://***@{host}"),
        None => "postgresql://***".to_string(),
    }
}
