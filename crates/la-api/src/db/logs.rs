//! Log record queries and the PostgreSQL `LogStore`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use la_ingest::{
    BulkInsertOutcome, KeywordMatch, LogFilter, LogStore, RecordFailure, SortKey, SortOrder,
    StoreError, StoreResult,
};
use la_protocol::{LogRecord, StoredLog};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// Postgres caps a statement at 65535 bind parameters; eight per row.
const ROWS_PER_STATEMENT: usize = 4096;

const LOG_COLUMNS: &str = "id, timestamp, level, message, source, raw_log, metadata, created_at";

/// Log row returned from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LogRow {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
    pub source: String,
    pub raw_log: String,
    pub metadata: Json<HashMap<String, String>>,
    pub created_at: DateTime<Utc>,
}

impl From<LogRow> for StoredLog {
    fn from(row: LogRow) -> Self {
        StoredLog {
            id: row.id,
            record: LogRecord {
                timestamp: row.timestamp,
                level: row.level,
                message: row.message,
                source: row.source,
                raw_log: row.raw_log,
                metadata: row.metadata.0,
            },
            created_at: row.created_at,
        }
    }
}

/// Insert rows with a single multi-row statement.
pub async fn insert_rows(pool: &PgPool, rows: &[StoredLog]) -> Result<(), sqlx::Error> {
    if rows.is_empty() {
        return Ok(());
    }
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("INSERT INTO logs ({LOG_COLUMNS}) "));
    qb.push_values(rows, |mut b, log| {
        b.push_bind(log.id)
            .push_bind(log.record.timestamp)
            .push_bind(log.record.level.clone())
            .push_bind(log.record.message.clone())
            .push_bind(log.record.source.clone())
            .push_bind(log.record.raw_log.clone())
            .push_bind(Json(log.record.metadata.clone()))
            .push_bind(log.created_at);
    });
    qb.build().execute(pool).await?;
    Ok(())
}

/// Fetch one page of matching rows.
pub async fn query_page(
    pool: &PgPool,
    filter: &LogFilter,
    sort: &[SortKey],
    skip: u64,
    limit: u64,
) -> Result<Vec<LogRow>, sqlx::Error> {
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {LOG_COLUMNS} FROM logs"));
    push_filter(&mut qb, filter);

    for (i, key) in sort.iter().enumerate() {
        qb.push(if i == 0 { " ORDER BY " } else { ", " });
        // Column names come from the SortField allow-list only.
        qb.push(key.field.as_str());
        qb.push(match key.order {
            SortOrder::Asc => " ASC",
            SortOrder::Desc => " DESC",
        });
    }

    qb.push(" LIMIT ").push_bind(to_i64(limit));
    qb.push(" OFFSET ").push_bind(to_i64(skip));

    qb.build_query_as::<LogRow>().fetch_all(pool).await
}

/// Count matching rows.
pub async fn count_matching(pool: &PgPool, filter: &LogFilter) -> Result<i64, sqlx::Error> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM logs");
    push_filter(&mut qb, filter);
    qb.build_query_scalar::<i64>().fetch_one(pool).await
}

/// Check whether a full-text index covers `field` on `logs`.
pub async fn has_text_index(pool: &PgPool, field: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(
             SELECT 1 FROM pg_indexes
             WHERE tablename = 'logs' AND indexdef ILIKE $1
         )",
    )
    .bind(format!("%to_tsvector%{field}%"))
    .fetch_one(pool)
    .await
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &LogFilter) {
    let mut first = true;

    if let Some(start) = filter.start {
        clause(qb, &mut first);
        qb.push("timestamp >= ").push_bind(start);
    }
    if let Some(end) = filter.end {
        clause(qb, &mut first);
        qb.push("timestamp <= ").push_bind(end);
    }
    if let Some(level) = &filter.level {
        clause(qb, &mut first);
        qb.push("level = ").push_bind(level.clone());
    }
    if let Some(source) = &filter.source {
        clause(qb, &mut first);
        qb.push("source = ").push_bind(source.clone());
    }
    match &filter.keyword {
        Some(KeywordMatch::FullText(keyword)) => {
            clause(qb, &mut first);
            match any_word_query(keyword) {
                Some(query) => {
                    qb.push("to_tsvector('english', message) @@ to_tsquery('english', ")
                        .push_bind(query)
                        .push(")");
                }
                None => {
                    qb.push("FALSE");
                }
            }
        }
        Some(KeywordMatch::Substring(keyword)) => {
            let pattern = format!("%{}%", escape_like(keyword));
            clause(qb, &mut first);
            qb.push("(message ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR source ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        None => {}
    }
}

fn clause(qb: &mut QueryBuilder<'_, Postgres>, first: &mut bool) {
    qb.push(if *first { " WHERE " } else { " AND " });
    *first = false;
}

/// `a | b | c` over the alphanumeric words of `keyword`.
fn any_word_query(keyword: &str) -> Option<String> {
    let words: Vec<String> = keyword
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    (!words.is_empty()).then(|| words.join(" | "))
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Data exceptions (22xxx) and integrity violations (23xxx) are the row's
/// fault; anything else is the store's.
fn is_row_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db
            .code()
            .is_some_and(|code| code.starts_with("22") || code.starts_with("23")),
        _ => false,
    }
}

fn store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Backend(other.to_string()),
    }
}

/// `LogStore` over the `logs` table.
#[derive(Clone)]
pub struct PgLogStore {
    pool: PgPool,
}

impl PgLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert one chunk; on a row-level failure retry row by row to isolate
    /// the rejected records.
    async fn insert_chunk(
        &self,
        chunk: &[StoredLog],
        offset: usize,
        outcome: &mut BulkInsertOutcome,
    ) -> Result<(), sqlx::Error> {
        match insert_rows(&self.pool, chunk).await {
            Ok(()) => {
                outcome.inserted.extend_from_slice(chunk);
                Ok(())
            }
            Err(e) if is_row_error(&e) => {
                tracing::debug!(
                    rows = chunk.len(),
                    error = %e,
                    "multi-row insert rejected, isolating rows"
                );
                for (i, log) in chunk.iter().enumerate() {
                    match insert_rows(&self.pool, std::slice::from_ref(log)).await {
                        Ok(()) => outcome.inserted.push(log.clone()),
                        Err(e) if is_row_error(&e) => outcome.failures.push(RecordFailure {
                            index: offset + i,
                            reason: e.to_string(),
                        }),
                        Err(e) => return Err(e),
                    }
                }
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl LogStore for PgLogStore {
    async fn bulk_insert(&self, records: Vec<LogRecord>) -> StoreResult<BulkInsertOutcome> {
        let rows: Vec<StoredLog> = records.into_iter().map(StoredLog::new).collect();
        let mut outcome = BulkInsertOutcome::default();

        for (n, chunk) in rows.chunks(ROWS_PER_STATEMENT).enumerate() {
            let offset = n * ROWS_PER_STATEMENT;
            if let Err(e) = self.insert_chunk(chunk, offset, &mut outcome).await {
                if outcome.inserted.is_empty() && outcome.failures.is_empty() {
                    return Err(store_error(e));
                }
                // Earlier chunks are committed; report the rest as rejected.
                let reason = e.to_string();
                let attempted = outcome.inserted.len() + outcome.failures.len();
                tracing::warn!(
                    written = outcome.inserted.len(),
                    abandoned = rows.len() - attempted,
                    error = %reason,
                    "bulk insert interrupted"
                );
                let done: HashSet<Uuid> = outcome.inserted.iter().map(|l| l.id).collect();
                let failed: HashSet<usize> = outcome.failures.iter().map(|f| f.index).collect();
                for (index, log) in rows.iter().enumerate().skip(offset) {
                    if !done.contains(&log.id) && !failed.contains(&index) {
                        outcome.failures.push(RecordFailure {
                            index,
                            reason: reason.clone(),
                        });
                    }
                }
                break;
            }
        }

        Ok(outcome)
    }

    async fn has_text_capability(&self, field: &str) -> StoreResult<bool> {
        has_text_index(&self.pool, field).await.map_err(store_error)
    }

    async fn query(
        &self,
        filter: &LogFilter,
        sort: &[SortKey],
        skip: u64,
        limit: u64,
    ) -> StoreResult<Vec<StoredLog>> {
        let rows = query_page(&self.pool, filter, sort, skip, limit)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(StoredLog::from).collect())
    }

    async fn count(&self, filter: &LogFilter) -> StoreResult<u64> {
        let total = count_matching(&self.pool, filter)
            .await
            .map_err(store_error)?;
        Ok(u64::try_from(total).unwrap_or(0))
    }
}
