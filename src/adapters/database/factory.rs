//! Store factory
//!
//! This module builds the keyed store selected by configuration.

use crate::adapters::database::memory::MemoryStore;
use crate::adapters::database::traits::KeyedStore;
use crate::adapters::postgresql::{PostgreSQLClient, PostgreSQLStore};
use crate::config::schema::{StoreTarget, SyncConfig};
use crate::domain::{Result, SyncError};
use std::sync::Arc;

/// Create a keyed store based on the configuration
///
/// # Errors
///
/// Returns an error if the PostgreSQL section is missing or the pool cannot
/// be created.
pub async fn create_store(config: &SyncConfig) -> Result<Arc<dyn KeyedStore>> {
    match config.store_target {
        StoreTarget::Memory => {
            tracing::info!("Creating in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                SyncError::Configuration(
                    "postgresql configuration is required when store_target = 'postgresql'"
                        .to_string(),
                )
            })?;

            tracing::info!("Creating PostgreSQL store");
            let client = PostgreSQLClient::new(pg_config.clone()).await?;
            tracing::debug!(connection = %client.connection_string_safe(), "PostgreSQL pool ready");

            Ok(Arc::new(PostgreSQLStore::new(client)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::SyncConfig;

    #[tokio::test]
    async fn test_memory_target() {
        let mut config = SyncConfig::default();
        config.store_target = StoreTarget::Memory;

        let store = create_store(&config).await.unwrap();
        assert_eq!(store.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_missing_postgresql_section() {
        let mut config = SyncConfig::default();
        config.store_target = StoreTarget::PostgreSQL;
        config.postgresql = None;

        let result = create_store(&config).await;
        assert!(matches!(result, Err(SyncError::Configuration(_))));
    }
}
