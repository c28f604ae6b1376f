//! SQLite connection pool.
//!
//! Pools are opened with the `REGEXP` SQL function registered, which every
//! compiled filter predicate relies on. Opening is a single attempt: driver
//! errors surface unchanged. Lock contention is handled by SQLite's busy
//! timeout rather than by retrying in this layer.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::{MetaQueryError, Result};

/// Connection pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
    /// Seconds to wait for a free pooled connection.
    pub acquire_timeout_secs: u64,
    /// Seconds before an idle connection is closed.
    pub idle_timeout_secs: Option<u64>,
    /// How long a statement waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
    /// Create the database file if it does not exist.
    pub create_if_missing: bool,
    /// Journal mode; `Wal` lets readers run next to a writer.
    pub journal_mode: SqliteJournalMode,
    /// Prepared statements cached per connection.
    pub statement_cache_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout_secs: 30,
            idle_timeout_secs: Some(600),
            busy_timeout_ms: 5000,
            create_if_missing: true,
            journal_mode: SqliteJournalMode::Wal,
            statement_cache_capacity: 100,
        }
    }
}

impl PoolConfig {
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_create_if_missing(mut self, create_if_missing: bool) -> Self {
        self.create_if_missing = create_if_missing;
        self
    }

    pub fn with_busy_timeout_ms(mut self, busy_timeout_ms: u64) -> Self {
        self.busy_timeout_ms = busy_timeout_ms;
        self
    }

    pub fn with_journal_mode(mut self, journal_mode: SqliteJournalMode) -> Self {
        self.journal_mode = journal_mode;
        self
    }

    fn connect_options(&self, uri: &str) -> Result<SqliteConnectOptions> {
        let options = SqliteConnectOptions::from_str(uri)
            .map_err(|e| MetaQueryError::Connection(format!("Invalid SQLite URI {}: {}", uri, e)))?
            .create_if_missing(self.create_if_missing)
            .busy_timeout(Duration::from_millis(self.busy_timeout_ms))
            .journal_mode(self.journal_mode)
            .statement_cache_capacity(self.statement_cache_capacity)
            .with_regexp();
        Ok(options)
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .idle_timeout(self.idle_timeout_secs.map(Duration::from_secs))
    }
}

/// Pooled SQLite database handle.
#[derive(Clone)]
pub struct Connection {
    pool: SqlitePool,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("size", &self.pool.size())
            .field("num_idle", &self.pool.num_idle())
            .finish()
    }
}

impl Connection {
    /// Opens a pool on `uri` (e.g. `sqlite://meta.db`).
    ///
    /// # Errors
    ///
    /// [`MetaQueryError::Connection`] for an empty or malformed URI; otherwise
    /// the driver error converted by `From<sqlx::Error>` (a missing file
    /// without `create_if_missing` is `Connection`, a locked file `Timeout`).
    #[instrument(skip(config), fields(max_connections = config.max_connections))]
    pub async fn open(uri: &str, config: PoolConfig) -> Result<Self> {
        if uri.is_empty() {
            return Err(MetaQueryError::Connection(
                "SQLite URI cannot be empty".to_string(),
            ));
        }

        let options = config.connect_options(uri)?;
        let pool = config.pool_options().connect_with(options).await?;
        debug!(journal_mode = ?config.journal_mode, "Pool connected");

        let connection = Self { pool };
        connection.ping().await?;
        info!("SQLite pool ready");
        Ok(connection)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Runs `SELECT 1` on a pooled connection.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_default() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.acquire_timeout_secs, 30);
        assert_eq!(config.idle_timeout_secs, Some(600));
        assert_eq!(config.busy_timeout_ms, 5000);
        assert!(config.create_if_missing);
        assert!(matches!(config.journal_mode, SqliteJournalMode::Wal));
    }

    #[test]
    fn test_pool_config_builder() {
        let config = PoolConfig::default()
            .with_max_connections(1)
            .with_create_if_missing(false)
            .with_busy_timeout_ms(250)
            .with_journal_mode(SqliteJournalMode::Delete);

        assert_eq!(config.max_connections, 1);
        assert!(!config.create_if_missing);
        assert_eq!(config.busy_timeout_ms, 250);
        assert!(matches!(config.journal_mode, SqliteJournalMode::Delete));
    }

    #[test]
    fn test_malformed_uri_rejected() {
        let err = PoolConfig::default().connect_options("sqlite://meta.db?bogus=1").unwrap_err();
        assert!(matches!(err, MetaQueryError::Connection(_)));
    }

    #[tokio::test]
    async fn test_open_rejects_empty_uri() {
        let err = Connection::open("", PoolConfig::default()).await.unwrap_err();
        assert!(matches!(err, MetaQueryError::Connection(_)));
    }

    #[tokio::test]
    async fn test_open_missing_file_without_create() {
        let dir = tempfile::tempdir().unwrap();
        let uri = format!("sqlite://{}", dir.path().join("absent.db").display());
        let config = PoolConfig::default().with_create_if_missing(false);

        let err = Connection::open(&uri, config).await.unwrap_err();
        assert!(err.is_backend());
    }

    #[tokio::test]
    async fn test_open_and_ping() {
        let dir = tempfile::tempdir().unwrap();
        let uri = format!("sqlite://{}", dir.path().join("meta.db").display());

        let conn = Connection::open(&uri, PoolConfig::default()).await.unwrap();
        conn.ping().await.unwrap();
        assert!(dir.path().join("meta.db").exists());
        conn.close().await;
    }
}
