//! Database module for persistent storage.
//!
//! Provides async SQLite database access using SQLx for:
//! - Tracked-channel registry (which channels each source watches)
//! - Voice-time ledger (per-day accumulating counters per scope and user)
//! - Deleted-channel map (channel → category, kept past deletion)
//!
//! All three stores share one pool, one schema-setup pass, and one durability
//! guarantee: an operation that returns `Ok` has been committed.

mod deleted;
mod ledger;
mod period;
mod tracked;

pub use deleted::DeletedChannelRepository;
pub use ledger::{PeriodTotals, VoiceTimeRepository};
pub use period::Period;
pub use tracked::TrackedChannelRepository;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure (open, read, or commit).
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),
    /// A negative duration was passed to the voice-time ledger.
    #[error("negative duration: {0}")]
    NegativeDuration(i64),
    /// An aggregation period label that is not recognized.
    #[error("unknown period: {0}")]
    UnknownPeriod(String),
}

/// Database handle with connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connection acquire timeout - prevents connection storms from blocking indefinitely.
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Maximum time a connection can remain idle before being closed.
    const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Open a database connection pool.
    ///
    /// `":memory:"` opens a private in-memory database; any other value is
    /// treated as a file path (created along with its parent directory if
    /// missing). Call [`Database::ensure_initialized`] before issuing
    /// operations.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let pool = if path == ":memory:" {
            // Use a uniquely named shared-cache memory database per call.
            // `file::memory:` is global-ish and will collide across parallel tests.
            let id = MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed);
            let memdb_uri = format!(
                "file:voicelog-memdb-{}-{}?mode=memory&cache=shared",
                std::process::id(),
                id
            );

            let options = SqliteConnectOptions::new()
                .filename(&memdb_uri)
                .shared_cache(true)
                .create_if_missing(true);

            SqlitePoolOptions::new()
                .max_connections(1)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .idle_timeout(Some(Self::IDLE_TIMEOUT))
                .test_before_acquire(true)
                .connect_with(options)
                .await?
        } else {
            if let Some(parent) = Path::new(path).parent()
                && !parent.as_os_str().is_empty()
                && let Err(e) = std::fs::create_dir_all(parent)
            {
                tracing::warn!(path = %parent.display(), error = %e, "Failed to create database directory");
            }

            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true);

            SqlitePoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .idle_timeout(Some(Self::IDLE_TIMEOUT))
                .test_before_acquire(true)
                .connect_with(options)
                .await?
        };

        info!(path = %path, "Database connected");

        Ok(Self { pool })
    }

    /// Ensure pragmas and schema are in place.
    ///
    /// Idempotent: every statement is a no-op against an already-initialized
    /// store, so repeated calls (and repeated restarts against the same file)
    /// are safe.
    pub async fn ensure_initialized(&self) -> Result<(), StoreError> {
        // WAL mode allows reads to happen while writes are in progress
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&self.pool)
            .await?;

        sqlx::query("PRAGMA foreign_keys=ON")
            .execute(&self.pool)
            .await?;

        // NORMAL provides good durability while being faster than FULL
        sqlx::query("PRAGMA synchronous=NORMAL")
            .execute(&self.pool)
            .await?;

        Self::create_schema(&self.pool).await?;

        // Check database integrity on startup (prevents silent corruption from crashes)
        let integrity_result: String = sqlx::query_scalar("PRAGMA integrity_check")
            .fetch_one(&self.pool)
            .await?;

        if integrity_result != "ok" {
            tracing::error!(
                integrity_check = %integrity_result,
                "Database integrity check FAILED - corruption detected!"
            );
            return Err(StoreError::Sqlx(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Database integrity check failed: {}", integrity_result),
            ))));
        }

        info!("Database schema checked/applied");

        Ok(())
    }

    /// Close the pool, waiting for in-flight operations to finish.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database closed");
    }

    /// Get reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get tracked-channel repository.
    pub fn tracked(&self) -> TrackedChannelRepository<'_> {
        TrackedChannelRepository::new(&self.pool)
    }

    /// Get voice-time ledger repository.
    pub fn voice_time(&self) -> VoiceTimeRepository<'_> {
        VoiceTimeRepository::new(&self.pool)
    }

    /// Get deleted-channel repository.
    pub fn deleted_channels(&self) -> DeletedChannelRepository<'_> {
        DeletedChannelRepository::new(&self.pool)
    }

    /// Create the three tables if absent.
    async fn create_schema(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tracked_channels (
                source     TEXT    NOT NULL,
                channel_id INTEGER NOT NULL,
                PRIMARY KEY (source, channel_id)
            )
            "#,
        )
        .execute(pool)
        .await?;

        // bucket_start is the unix timestamp of the UTC midnight opening the
        // day bucket. Coarser periods sum day buckets at read time.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS voice_time (
                scope_key    INTEGER NOT NULL,
                user_id      INTEGER NOT NULL,
                bucket_start INTEGER NOT NULL,
                seconds      INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (scope_key, user_id, bucket_start)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS voice_time_user_bucket
                ON voice_time (user_id, bucket_start)
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS deleted_channels (
                channel_id  INTEGER PRIMARY KEY,
                category_id INTEGER NOT NULL,
                deleted_at  INTEGER NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Sqlx(err)
    }
}
