//! Service initialization

use crate::config::{ServerConfig, StoreConfig};
use sentra_runtime::LifecycleService;
use sentra_scoring::MarketView;
use sentra_store::{MemoryStore, Store};
use std::sync::Arc;
use tracing::info;

/// Build the lifecycle service for the configured store backend
pub async fn init_service(
    config: &ServerConfig,
) -> anyhow::Result<Arc<LifecycleService<dyn Store>>> {
    let store: Arc<dyn Store> = match &config.store {
        StoreConfig::Memory => {
            info!("Using in-memory store");
            Arc::new(MemoryStore::new())
        }
        #[cfg(feature = "postgres")]
        StoreConfig::Postgres { url } => {
            info!("Connecting to PostgreSQL store");
            Arc::new(sentra_store::PostgresStore::new(url).await?)
        }
        #[cfg(not(feature = "postgres"))]
        StoreConfig::Postgres { .. } => {
            anyhow::bail!("server was built without postgres support")
        }
    };

    let market = MarketView {
        sector_performance: config.sector_performance.clone(),
    };

    let service = LifecycleService::new(store, Arc::new(config.engine.clone()))
        .with_market_view(market);

    Ok(Arc::new(service))
}
