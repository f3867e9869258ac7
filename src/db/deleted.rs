//! Deleted-channel map.
//!
//! Remembers which category a channel belonged to after the channel itself is
//! gone, so it can be recreated in place. Last write wins: re-registering a
//! channel overwrites the prior category.

use super::StoreError;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

/// Repository for deleted-channel category lookups.
pub struct DeletedChannelRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DeletedChannelRepository<'a> {
    /// Create a new deleted-channel repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record the category a deleted channel belonged to. Last write wins.
    pub async fn register(&self, channel_id: i64, category_id: i64) -> Result<(), StoreError> {
        let now = Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO deleted_channels (channel_id, category_id, deleted_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(channel_id)
        .bind(category_id)
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Look up the category a deleted channel belonged to.
    pub async fn get_category(&self, channel_id: i64) -> Result<Option<i64>, StoreError> {
        let category = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT category_id FROM deleted_channels
            WHERE channel_id = ?
            "#,
        )
        .bind(channel_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(category)
    }

    /// Remove records registered before `cutoff`. Returns the number removed.
    ///
    /// Retention is the caller's policy; this is the hook it calls.
    pub async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM deleted_channels
            WHERE deleted_at < ?
            "#,
        )
        .bind(cutoff.timestamp())
        .execute(self.pool)
        .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            debug!(removed, "Pruned deleted-channel records");
        }

        Ok(removed)
    }
}
