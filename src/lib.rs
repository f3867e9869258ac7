//! # voicelog-store
//!
//! Embedded SQLite persistence layer for a voice-channel monitoring
//! application, built on async SQLx.
//!
//! Three responsibilities share one storage handle:
//!
//! - **Tracked-channel registry** — set membership of (source, channel) pairs
//! - **Voice-time ledger** — per-day accumulating counters, queryable over
//!   daily/weekly/monthly/yearly/all-time windows
//! - **Deleted-channel map** — channel → category mapping that outlives the
//!   channel itself
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use voicelog_store::Database;
//!
//! # async fn run() -> Result<(), voicelog_store::StoreError> {
//! let db = Database::open("voice_logs.db").await?;
//! db.ensure_initialized().await?;
//!
//! db.tracked().register(12345, "voice_monitor").await?;
//! db.voice_time().add_time(1, 123, 3600).await?;
//!
//! db.close().await;
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod db;

pub use config::{Config, ConfigError, DatabaseConfig};
pub use db::{
    Database, DeletedChannelRepository, Period, PeriodTotals, StoreError,
    TrackedChannelRepository, VoiceTimeRepository,
};
