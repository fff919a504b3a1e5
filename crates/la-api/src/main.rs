//! Log analytics API: ingestion and search REST server.
//!
//! Accepts raw and batched log uploads, persists normalized records and
//! serves paginated search over them.

use la_api::config::ApiConfig;
use la_api::state::AppState;
use la_api::{db, routes};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "la-api starting");

    let config = ApiConfig::from_env();
    tracing::info!(
        classify_batch_size = config.ingest.classify_batch_size,
        persist_batch_size = config.ingest.persist_batch_size,
        max_concurrent_batches = config.ingest.max_concurrent_batches,
        stream_buffer = config.ingest.stream_buffer,
        max_page_size = config.query.max_page_size,
        "configuration loaded"
    );

    // Connect to PostgreSQL if DATABASE_URL is set, otherwise use the in-memory store.
    let state = if let Some(database_url) = &config.database_url {
        tracing::info!("connecting to PostgreSQL");
        let pool = db::connect(database_url).await?;
        AppState::with_pool(pool, &config)
    } else {
        tracing::warn!("DATABASE_URL not set, using in-memory store");
        AppState::with_config(&config)
    };

    let app = routes::build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
