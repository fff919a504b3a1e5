//! Search: raw criteria → validated `QuerySpec` → store execution.
//!
//! Sort and pagination input never fails: unknown sort fields or orders fall
//! back to `timestamp desc`, and page/limit are clamped into range.

use la_protocol::{Pagination, SearchPage, SortEcho};
use serde::Deserialize;
use std::sync::Arc;

use crate::config::QueryConfig;
use crate::error::{QueryError, QueryResult};
use crate::store::{KeywordMatch, LogFilter, LogStore, SortField, SortKey, SortOrder};
use crate::timestamp;

/// Caller-supplied search input, as received (e.g. HTTP query parameters).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub level: Option<String>,
    pub source: Option<String>,
    pub keyword: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Validated, normalized search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    /// Range, level and source conditions.
    pub filter: LogFilter,
    /// Keyword, matched by full text or substring once store capability is known.
    pub keyword: Option<String>,
    pub sort: SortKey,
    /// 1-based page number.
    pub page: u64,
    pub page_size: u64,
}

impl QuerySpec {
    pub fn from_criteria(criteria: &SearchCriteria, config: &QueryConfig) -> QueryResult<Self> {
        let config = config.normalized();

        let sort = SortKey {
            field: present(&criteria.sort_by)
                .and_then(SortField::parse)
                .unwrap_or(SortField::Timestamp),
            order: present(&criteria.sort_order)
                .and_then(SortOrder::parse)
                .unwrap_or(SortOrder::Desc),
        };

        let page = present(&criteria.page)
            .and_then(|p| p.parse::<i64>().ok())
            .map_or(1, |p| p.max(1) as u64);
        let page_size = present(&criteria.limit)
            .and_then(|l| l.parse::<i64>().ok())
            .map_or(config.default_page_size, |l| {
                (l.max(1) as u64).min(config.max_page_size)
            });

        let filter = LogFilter {
            start: time_bound("startTime", present(&criteria.start_time))?,
            end: time_bound("endTime", present(&criteria.end_time))?,
            level: present(&criteria.level).map(str::to_string),
            source: present(&criteria.source).map(str::to_string),
            keyword: None,
        };

        Ok(Self {
            filter,
            keyword: present(&criteria.keyword).map(str::to_string),
            sort,
            page,
            page_size,
        })
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Primary key followed by `id desc` unless the primary key is `id`.
    pub fn sort_keys(&self) -> Vec<SortKey> {
        let mut keys = vec![self.sort];
        if self.sort.field != SortField::Id {
            keys.push(SortKey {
                field: SortField::Id,
                order: SortOrder::Desc,
            });
        }
        keys
    }

    /// The filter with the keyword attached as full text or substring.
    pub fn resolved_filter(&self, text_capable: bool) -> LogFilter {
        let mut filter = self.filter.clone();
        filter.keyword = self.keyword.clone().map(|k| {
            if text_capable {
                KeywordMatch::FullText(k)
            } else {
                KeywordMatch::Substring(k)
            }
        });
        filter
    }

    pub fn sort_echo(&self) -> SortEcho {
        SortEcho {
            field: self.sort.field.as_str().to_string(),
            order: self.sort.order.as_str().to_string(),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn time_bound(
    field: &'static str,
    value: Option<&str>,
) -> QueryResult<Option<chrono::DateTime<chrono::Utc>>> {
    value
        .map(|v| {
            timestamp::normalize(v).map_err(|_| QueryError::InvalidTimeBound {
                field,
                value: v.to_string(),
            })
        })
        .transpose()
}

/// Executes searches against a `LogStore`.
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn LogStore>,
    config: QueryConfig,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn LogStore>, config: QueryConfig) -> Self {
        Self {
            store,
            config: config.normalized(),
        }
    }

    pub async fn search(&self, criteria: &SearchCriteria) -> QueryResult<SearchPage> {
        let spec = QuerySpec::from_criteria(criteria, &self.config)?;
        self.execute(&spec).await
    }

    pub async fn execute(&self, spec: &QuerySpec) -> QueryResult<SearchPage> {
        let text_capable = match spec.keyword {
            Some(_) => self.store.has_text_capability("message").await?,
            None => false,
        };
        let filter = spec.resolved_filter(text_capable);
        let sort = spec.sort_keys();

        let (logs, total) = tokio::try_join!(
            self.store.query(&filter, &sort, spec.skip(), spec.page_size),
            self.store.count(&filter),
        )?;

        tracing::debug!(
            page = spec.page,
            page_size = spec.page_size,
            returned = logs.len(),
            total,
            full_text = text_capable,
            "search executed"
        );

        let last_id = logs.last().map(|l| l.id);
        Ok(SearchPage {
            logs,
            pagination: Pagination::new(spec.page, spec.page_size, total, last_id),
            sort: spec.sort_echo(),
        })
    }
}
