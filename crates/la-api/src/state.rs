//! Shared application state for the Axum server.
//!
//! Supports two modes:
//! - **Database mode**: `PgLogStore` over a `PgPool` (production).
//! - **In-memory mode**: `MockLogStore` (tests and development).

use std::sync::Arc;

use la_ingest::{IngestConfig, IngestPipeline, LogStore, MockLogStore, QueryConfig, QueryEngine};
use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::db::logs::PgLogStore;

/// Shared application state, cheap to clone into every handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: IngestPipeline,
    pub query: QueryEngine,
}

impl AppState {
    /// Create state backed by a PostgreSQL pool.
    pub fn with_pool(pool: PgPool, config: &ApiConfig) -> Self {
        Self::with_store(
            Arc::new(PgLogStore::new(pool)),
            config.ingest,
            config.query,
        )
    }

    /// Create state over any store.
    pub fn with_store(
        store: Arc<dyn LogStore>,
        ingest: IngestConfig,
        query: QueryConfig,
    ) -> Self {
        Self {
            pipeline: IngestPipeline::new(store.clone(), ingest),
            query: QueryEngine::new(store, query),
        }
    }

    /// Create in-memory state with the given tuning.
    pub fn with_config(config: &ApiConfig) -> Self {
        Self::with_store(Arc::new(MockLogStore::new()), config.ingest, config.query)
    }

    /// Create in-memory state (for tests).
    pub fn new() -> Self {
        Self::with_config(&ApiConfig::default())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
