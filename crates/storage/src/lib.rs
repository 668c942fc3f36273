pub mod backend;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod seed;

use std::sync::Arc;

use tracing::info;

use salesdash_core::config::PostgresConfig;

pub use backend::TransactionStore;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Shared handle to the store, passed down explicitly to every consumer.
pub type SharedStore = Arc<dyn TransactionStore>;

/// Open the shared store from config: PostgreSQL when configured, otherwise
/// an in-process [`MemoryStore`].
///
/// The PostgreSQL pool connects lazily. Migrations are attempted here and
/// retried on later store access until they succeed; an unreachable database
/// is logged, not fatal.
pub async fn open_store(config: &PostgresConfig) -> Result<SharedStore, StoreError> {
    if config.is_configured() {
        let store = PgStore::connect_lazy(config)?;
        store.migrate_or_warn().await;
        Ok(Arc::new(store))
    } else {
        info!("Storage: PG_URL/PG_USERNAME not set — using in-memory store");
        Ok(Arc::new(MemoryStore::new()))
    }
}
