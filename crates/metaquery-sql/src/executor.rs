//! Statement execution with observability.
//!
//! A [`StatementExecutor`] receives a [`CompiledQuery`], binds its parameters
//! positionally and runs it. Execution errors are returned as they come from
//! the driver: no retry, no partial rows.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Row as _, TypeInfo, ValueRef};
use tracing::{debug, instrument, warn};

use crate::connection::Connection;
use crate::query::CompiledQuery;
use crate::{MetaQueryError, Result};

/// One result row: raw text cells in projection order (`None` for NULL).
///
/// INTEGER and REAL cells are rendered as their decimal text, BLOB cells as
/// lossy UTF-8.
pub type Row = Vec<Option<String>>;

/// Runs compiled statements against a backend.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Runs a row-returning statement.
    async fn fetch_rows(&self, query: &CompiledQuery) -> Result<Vec<Row>>;

    /// Runs a statement that modifies rows, returning the affected-row count.
    async fn execute(&self, query: &CompiledQuery) -> Result<u64>;
}

/// Configuration for statement execution.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Threshold for slow statement logging in milliseconds
    pub slow_query_threshold_ms: u64,
    /// Number of SQL characters included in log fields
    pub sql_preview_len: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            slow_query_threshold_ms: 1000, // 1 second
            sql_preview_len: 100,
        }
    }
}

impl ExecutorConfig {
    pub fn with_slow_query_threshold_ms(mut self, threshold_ms: u64) -> Self {
        self.slow_query_threshold_ms = threshold_ms;
        self
    }

    pub fn with_sql_preview_len(mut self, len: usize) -> Self {
        self.sql_preview_len = len;
        self
    }
}

/// Executor over a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
    config: ExecutorConfig,
}

impl SqliteExecutor {
    pub fn new(connection: &Connection) -> Self {
        Self::with_config(connection, ExecutorConfig::default())
    }

    pub fn with_config(connection: &Connection, config: ExecutorConfig) -> Self {
        Self {
            pool: connection.pool().clone(),
            config,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    fn bind<'q>(
        query: &'q CompiledQuery,
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        query
            .params
            .iter()
            .fold(sqlx::query(&query.sql), |statement, param| statement.bind(param.as_str()))
    }

    fn decode_row(row: &SqliteRow, width: usize) -> Result<Row> {
        if row.len() != width {
            return Err(MetaQueryError::Deserialization(format!(
                "Expected {} cells per row, backend returned {}",
                width,
                row.len()
            )));
        }
        (0..width).map(|index| Self::decode_cell(row, index)).collect()
    }

    /// Reads one cell as text, whatever its storage class.
    fn decode_cell(row: &SqliteRow, index: usize) -> Result<Option<String>> {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(None);
        }
        let storage = raw.type_info().name().to_string();

        let text = match storage.as_str() {
            "INTEGER" => row.try_get_unchecked::<i64, _>(index)?.to_string(),
            "REAL" => row.try_get_unchecked::<f64, _>(index)?.to_string(),
            "BLOB" => {
                let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
                String::from_utf8_lossy(&bytes).into_owned()
            }
            _ => row.try_get_unchecked::<String, _>(index)?,
        };
        Ok(Some(text))
    }

    /// Log statement completion with slow statement detection.
    fn log_completion(&self, query: &CompiledQuery, elapsed: Duration) {
        let elapsed_ms = elapsed.as_millis() as u64;
        let sql_preview = query.preview(self.config.sql_preview_len);

        if elapsed_ms >= self.config.slow_query_threshold_ms {
            warn!(
                sql = %sql_preview,
                elapsed_ms = elapsed_ms,
                threshold_ms = self.config.slow_query_threshold_ms,
                "Slow statement detected"
            );
        } else {
            debug!(sql = %sql_preview, elapsed_ms = elapsed_ms, "Statement completed");
        }
    }

    fn log_failure(&self, query: &CompiledQuery, elapsed: Duration, error: &sqlx::Error) {
        warn!(
            sql = %query.preview(self.config.sql_preview_len),
            params = query.params.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            error = %error,
            "Statement failed"
        );
    }
}

#[async_trait]
impl StatementExecutor for SqliteExecutor {
    #[instrument(skip_all, fields(params = query.params.len(), width = query.result_width))]
    async fn fetch_rows(&self, query: &CompiledQuery) -> Result<Vec<Row>> {
        let start = Instant::now();
        let rows = match Self::bind(query).fetch_all(&self.pool).await {
            Ok(rows) => rows,
            Err(e) => {
                self.log_failure(query, start.elapsed(), &e);
                return Err(MetaQueryError::from(e));
            }
        };
        self.log_completion(query, start.elapsed());
        debug!(rows = rows.len(), "Rows fetched");

        rows.iter()
            .map(|row| Self::decode_row(row, query.result_width))
            .collect()
    }

    #[instrument(skip_all, fields(params = query.params.len()))]
    async fn execute(&self, query: &CompiledQuery) -> Result<u64> {
        let start = Instant::now();
        match Self::bind(query).execute(&self.pool).await {
            Ok(result) => {
                self.log_completion(query, start.elapsed());
                let rows_affected = result.rows_affected();
                debug!(rows_affected = rows_affected, "Statement executed successfully");
                Ok(rows_affected)
            }
            Err(e) => {
                self.log_failure(query, start.elapsed(), &e);
                Err(MetaQueryError::from(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_config_default() {
        let config = ExecutorConfig::default();
        assert_eq!(config.slow_query_threshold_ms, 1000);
        assert_eq!(config.sql_preview_len, 100);
    }

    #[test]
    fn test_executor_config_builder() {
        let config = ExecutorConfig::default()
            .with_slow_query_threshold_ms(5)
            .with_sql_preview_len(20);
        assert_eq!(config.slow_query_threshold_ms, 5);
        assert_eq!(config.sql_preview_len, 20);
    }
}
