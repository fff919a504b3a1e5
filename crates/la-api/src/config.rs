//! HTTP server configuration.

use la_ingest::{IngestConfig, QueryConfig};
use serde::Deserialize;
use std::str::FromStr;

/// Top-level server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Listen address (e.g., "0.0.0.0").
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// PostgreSQL connection URL. In-memory store when absent.
    pub database_url: Option<String>,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3080
}

impl ApiConfig {
    /// Load config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load config through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let ingest = IngestConfig {
            classify_batch_size: parse_or(
                "LOG_VALIDATION_BATCH_SIZE",
                read("LOG_VALIDATION_BATCH_SIZE"),
                defaults.ingest.classify_batch_size,
            ),
            persist_batch_size: parse_or(
                "LOG_UPLOAD_BATCH_SIZE",
                read("LOG_UPLOAD_BATCH_SIZE"),
                defaults.ingest.persist_batch_size,
            ),
            max_concurrent_batches: parse_or(
                "MAX_CONCURRENT_BATCHES",
                read("MAX_CONCURRENT_BATCHES"),
                defaults.ingest.max_concurrent_batches,
            ),
            stream_buffer: parse_or(
                "STREAM_HIGH_WATER_MARK",
                read("STREAM_HIGH_WATER_MARK"),
                defaults.ingest.stream_buffer,
            ),
        };
        let query = QueryConfig {
            max_page_size: parse_or(
                "SEARCH_MAX_PAGE_SIZE",
                read("SEARCH_MAX_PAGE_SIZE"),
                defaults.query.max_page_size,
            ),
            ..defaults.query
        };

        Self {
            host: read("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", read("PORT"), defaults.port),
            database_url: read("DATABASE_URL"),
            ingest: ingest.normalized(),
            query: query.normalized(),
        }
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(
                key,
                value = %raw,
                default = %default,
                "invalid config value, using default"
            );
            default
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: None,
            ingest: IngestConfig::default(),
            query: QueryConfig::default(),
        }
    }
}
