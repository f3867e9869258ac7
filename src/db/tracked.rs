//! Tracked-channel registry.
//!
//! Set-like membership of (source, channel) pairs: a channel is either
//! tracked by a source or it is not. Redundant registration and removal of
//! absent pairs are defined no-ops, so duplicate bot events can never corrupt
//! the registry.

use super::StoreError;
use sqlx::SqlitePool;
use std::collections::HashSet;

/// Repository for tracked-channel operations.
pub struct TrackedChannelRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TrackedChannelRepository<'a> {
    /// Create a new tracked-channel repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a channel under a source. Idempotent.
    pub async fn register(&self, channel_id: i64, source: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO tracked_channels (source, channel_id)
            VALUES (?, ?)
            "#,
        )
        .bind(source)
        .bind(channel_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Unregister a channel from a source. Removing an absent pair is a no-op.
    pub async fn unregister(&self, channel_id: i64, source: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            DELETE FROM tracked_channels
            WHERE source = ? AND channel_id = ?
            "#,
        )
        .bind(source)
        .bind(channel_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Get every channel registered under a source.
    ///
    /// An unknown source yields an empty set.
    pub async fn get_tracked(&self, source: &str) -> Result<HashSet<i64>, StoreError> {
        let rows = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT channel_id FROM tracked_channels
            WHERE source = ?
            "#,
        )
        .bind(source)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Check whether a single (source, channel) pair is registered.
    pub async fn is_tracked(&self, channel_id: i64, source: &str) -> Result<bool, StoreError> {
        let row = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT 1 FROM tracked_channels
            WHERE source = ? AND channel_id = ?
            "#,
        )
        .bind(source)
        .bind(channel_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.is_some())
    }
}
