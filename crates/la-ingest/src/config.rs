//! Ingestion and search tuning knobs.
//!
//! Built once at startup and handed to `IngestPipeline::new` and
//! `QueryEngine::new`; nothing in this crate reads the environment.

use serde::Deserialize;

/// Ingestion pipeline configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IngestConfig {
    /// Lines buffered before a classification pass.
    #[serde(default = "default_batch_size")]
    pub classify_batch_size: usize,
    /// Records per bulk insert.
    #[serde(default = "default_batch_size")]
    pub persist_batch_size: usize,
    /// Bulk inserts allowed in flight per family pass.
    #[serde(default = "default_max_concurrent_batches")]
    pub max_concurrent_batches: usize,
    /// Lines handed to a processor per dispatch.
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,
}

fn default_batch_size() -> usize {
    10_000
}

fn default_max_concurrent_batches() -> usize {
    5
}

fn default_stream_buffer() -> usize {
    1_000
}

impl IngestConfig {
    /// Replace zero sizes with 1 so every stage makes progress.
    pub fn normalized(self) -> Self {
        Self {
            classify_batch_size: self.classify_batch_size.max(1),
            persist_batch_size: self.persist_batch_size.max(1),
            max_concurrent_batches: self.max_concurrent_batches.max(1),
            stream_buffer: self.stream_buffer.max(1),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            classify_batch_size: default_batch_size(),
            persist_batch_size: default_batch_size(),
            max_concurrent_batches: default_max_concurrent_batches(),
            stream_buffer: default_stream_buffer(),
        }
    }
}

/// Search configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
}

fn default_page_size() -> u64 {
    50
}

fn default_max_page_size() -> u64 {
    1_000
}

impl QueryConfig {
    pub fn normalized(self) -> Self {
        let max_page_size = self.max_page_size.max(1);
        Self {
            default_page_size: self.default_page_size.clamp(1, max_page_size),
            max_page_size,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}
