//! Voice-time ledger.
//!
//! Accumulates time-in-voice per (scope_key, user, UTC day) and answers
//! period-windowed totals.
//!
//! # Architecture
//! - Write-time aggregation: every write lands in a pre-aggregated day bucket
//!   via an atomic upsert, so interleaved writers never lose an update.
//! - Read queries only scan buckets inside the requested window, keeping them
//!   proportional to the scopes a user was active in, not to the number of
//!   raw events ever recorded.

use super::StoreError;
use super::period::Period;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;

/// Per-scope totals for one user over one period window.
#[derive(Debug, Clone)]
pub struct PeriodTotals {
    /// Accumulated seconds keyed by scope_key. Empty when the user has no
    /// recorded time inside the window.
    pub totals: HashMap<i64, i64>,
    /// Inclusive start of the window the totals were computed over.
    pub window_start: DateTime<Utc>,
    /// Exclusive end of the window.
    pub window_end: DateTime<Utc>,
}

/// Repository for voice-time accumulation and aggregation.
pub struct VoiceTimeRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> VoiceTimeRepository<'a> {
    /// Create a new voice-time repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Accumulate seconds into the current UTC day bucket.
    ///
    /// Negative durations are rejected with [`StoreError::NegativeDuration`];
    /// zero is accepted and leaves totals unchanged.
    pub async fn add_time(
        &self,
        scope_key: i64,
        user_id: i64,
        seconds: i64,
    ) -> Result<(), StoreError> {
        self.add_time_at(scope_key, user_id, seconds, Utc::now())
            .await
    }

    /// Accumulate seconds into the day bucket containing `at`.
    pub async fn add_time_at(
        &self,
        scope_key: i64,
        user_id: i64,
        seconds: i64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if seconds < 0 {
            return Err(StoreError::NegativeDuration(seconds));
        }

        let bucket_start = Period::bucket_start(at).timestamp();

        // Increment-or-insert in one statement; the accumulation happens
        // inside SQLite, never as read-modify-write at the caller.
        sqlx::query(
            r#"
            INSERT INTO voice_time (scope_key, user_id, bucket_start, seconds)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (scope_key, user_id, bucket_start)
            DO UPDATE SET seconds = seconds + excluded.seconds
            "#,
        )
        .bind(scope_key)
        .bind(user_id)
        .bind(bucket_start)
        .bind(seconds)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Per-scope totals for a user over the period window containing
    /// `reference`.
    pub async fn user_totals(
        &self,
        user_id: i64,
        period: Period,
        reference: DateTime<Utc>,
    ) -> Result<PeriodTotals, StoreError> {
        let (window_start, window_end) = period.window(reference);

        let rows = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT scope_key, SUM(seconds)
            FROM voice_time
            WHERE user_id = ? AND bucket_start >= ? AND bucket_start < ?
            GROUP BY scope_key
            "#,
        )
        .bind(user_id)
        .bind(window_start.timestamp())
        .bind(window_end.timestamp())
        .fetch_all(self.pool)
        .await?;

        Ok(PeriodTotals {
            totals: rows.into_iter().collect(),
            window_start,
            window_end,
        })
    }

    /// Top users by accumulated time within a scope over a period window,
    /// descending, at most `limit` entries.
    pub async fn top_users(
        &self,
        scope_key: i64,
        period: Period,
        reference: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<(i64, i64)>, StoreError> {
        let (window_start, window_end) = period.window(reference);

        let rows = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT user_id, SUM(seconds) AS total
            FROM voice_time
            WHERE scope_key = ? AND bucket_start >= ? AND bucket_start < ?
            GROUP BY user_id
            ORDER BY total DESC
            LIMIT ?
            "#,
        )
        .bind(scope_key)
        .bind(window_start.timestamp())
        .bind(window_end.timestamp())
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}
