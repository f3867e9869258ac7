//! Integration tests for the persistence layer.
//!
//! Each test runs against its own in-memory database, except the durability
//! test which reopens a file-backed database to prove writes survive a
//! restart.

use chrono::{DateTime, Duration, TimeZone, Utc};
use voicelog_store::{Database, Period, StoreError};

async fn setup() -> Database {
    let db = Database::open(":memory:").await.expect("Failed to open db");
    db.ensure_initialized()
        .await
        .expect("Failed to initialize db");
    db
}

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

#[tokio::test]
async fn register_is_idempotent() {
    let db = setup().await;
    let tracked = db.tracked();

    tracked.register(12345, "test_source").await.unwrap();
    tracked.register(67890, "test_source").await.unwrap();
    tracked.register(12345, "test_source").await.unwrap();

    let channels = tracked.get_tracked("test_source").await.unwrap();
    assert_eq!(channels.len(), 2);
    assert!(channels.contains(&12345));
    assert!(channels.contains(&67890));
}

#[tokio::test]
async fn unregister_removes_only_the_pair() {
    let db = setup().await;
    let tracked = db.tracked();

    tracked.register(11111, "src").await.unwrap();
    tracked.register(22222, "src").await.unwrap();
    tracked.unregister(11111, "src").await.unwrap();

    let channels = tracked.get_tracked("src").await.unwrap();
    assert!(!channels.contains(&11111));
    assert!(channels.contains(&22222));
}

#[tokio::test]
async fn unregister_nonexistent_is_a_noop() {
    let db = setup().await;
    let tracked = db.tracked();

    tracked.register(22222, "src").await.unwrap();
    tracked.unregister(99999, "src").await.unwrap();

    let channels = tracked.get_tracked("src").await.unwrap();
    assert_eq!(channels.len(), 1);
}

#[tokio::test]
async fn sources_are_independent() {
    let db = setup().await;
    let tracked = db.tracked();

    tracked.register(1, "alpha").await.unwrap();
    tracked.register(1, "beta").await.unwrap();
    tracked.unregister(1, "alpha").await.unwrap();

    assert!(tracked.get_tracked("alpha").await.unwrap().is_empty());
    assert!(tracked.is_tracked(1, "beta").await.unwrap());
    assert!(!tracked.is_tracked(1, "alpha").await.unwrap());
}

#[tokio::test]
async fn unknown_source_yields_empty_set() {
    let db = setup().await;
    let channels = db.tracked().get_tracked("nowhere").await.unwrap();
    assert!(channels.is_empty());
}

#[tokio::test]
async fn voice_time_accumulates_within_a_bucket() {
    let db = setup().await;
    let ledger = db.voice_time();

    ledger.add_time(1, 123, 3600).await.unwrap();
    ledger.add_time(1, 123, 10).await.unwrap();

    let result = ledger
        .user_totals(123, Period::Daily, Utc::now())
        .await
        .unwrap();
    assert_eq!(result.totals.get(&1), Some(&3610));

    // User with no recorded time gets an empty mapping, not an error
    let empty = ledger
        .user_totals(2, Period::Daily, Utc::now())
        .await
        .unwrap();
    assert!(empty.totals.is_empty());
}

#[tokio::test]
async fn totals_report_the_computed_window() {
    let db = setup().await;

    let reference = at(2026, 8, 12, 15, 30);
    let result = db
        .voice_time()
        .user_totals(123, Period::Daily, reference)
        .await
        .unwrap();

    assert_eq!(result.window_start, at(2026, 8, 12, 0, 0));
    assert_eq!(result.window_end, at(2026, 8, 13, 0, 0));
}

#[tokio::test]
async fn totals_are_grouped_by_scope() {
    let db = setup().await;
    let ledger = db.voice_time();
    let when = at(2026, 8, 12, 10, 0);

    ledger.add_time_at(1, 123, 600, when).await.unwrap();
    ledger.add_time_at(2, 123, 60, when).await.unwrap();
    ledger.add_time_at(1, 999, 5, when).await.unwrap();

    let result = ledger
        .user_totals(123, Period::Daily, when)
        .await
        .unwrap();
    assert_eq!(result.totals.len(), 2);
    assert_eq!(result.totals.get(&1), Some(&600));
    assert_eq!(result.totals.get(&2), Some(&60));
}

#[tokio::test]
async fn period_windows_select_the_right_buckets() {
    let db = setup().await;
    let ledger = db.voice_time();

    // 2026-08-10 is a Monday; 2026-08-16 the following Sunday.
    ledger
        .add_time_at(1, 123, 100, at(2026, 8, 10, 8, 0))
        .await
        .unwrap();
    ledger
        .add_time_at(1, 123, 20, at(2026, 8, 16, 22, 0))
        .await
        .unwrap();
    // Previous ISO week and previous month
    ledger
        .add_time_at(1, 123, 7, at(2026, 8, 9, 12, 0))
        .await
        .unwrap();
    ledger
        .add_time_at(1, 123, 3, at(2026, 7, 31, 12, 0))
        .await
        .unwrap();

    let daily = ledger
        .user_totals(123, Period::Daily, at(2026, 8, 16, 0, 0))
        .await
        .unwrap();
    assert_eq!(daily.totals.get(&1), Some(&20));

    let weekly = ledger
        .user_totals(123, Period::Weekly, at(2026, 8, 12, 0, 0))
        .await
        .unwrap();
    assert_eq!(weekly.totals.get(&1), Some(&120));

    let monthly = ledger
        .user_totals(123, Period::Monthly, at(2026, 8, 1, 0, 0))
        .await
        .unwrap();
    assert_eq!(monthly.totals.get(&1), Some(&127));

    let yearly = ledger
        .user_totals(123, Period::Yearly, at(2026, 8, 12, 0, 0))
        .await
        .unwrap();
    assert_eq!(yearly.totals.get(&1), Some(&130));

    let all_time = ledger
        .user_totals(123, Period::AllTime, at(2026, 8, 12, 0, 0))
        .await
        .unwrap();
    assert_eq!(all_time.totals.get(&1), Some(&130));
}

#[tokio::test]
async fn negative_duration_is_rejected() {
    let db = setup().await;
    let ledger = db.voice_time();

    let err = ledger.add_time(1, 123, -5).await.unwrap_err();
    assert!(matches!(err, StoreError::NegativeDuration(-5)));

    // Nothing was written
    let result = ledger
        .user_totals(123, Period::AllTime, Utc::now())
        .await
        .unwrap();
    assert!(result.totals.is_empty());
}

#[tokio::test]
async fn zero_duration_is_accepted() {
    let db = setup().await;
    let ledger = db.voice_time();

    ledger.add_time(1, 123, 0).await.unwrap();
    ledger.add_time(1, 123, 42).await.unwrap();

    let result = ledger
        .user_totals(123, Period::Daily, Utc::now())
        .await
        .unwrap();
    assert_eq!(result.totals.get(&1), Some(&42));
}

#[tokio::test]
async fn top_users_orders_and_limits() {
    let db = setup().await;
    let ledger = db.voice_time();
    let when = at(2026, 8, 12, 10, 0);

    ledger.add_time_at(1, 100, 50, when).await.unwrap();
    ledger.add_time_at(1, 200, 300, when).await.unwrap();
    ledger.add_time_at(1, 300, 120, when).await.unwrap();
    ledger.add_time_at(2, 400, 999, when).await.unwrap();

    let top = ledger
        .top_users(1, Period::Daily, when, 2)
        .await
        .unwrap();
    assert_eq!(top, vec![(200, 300), (300, 120)]);
}

#[tokio::test]
async fn deleted_channel_round_trip() {
    let db = setup().await;
    let deleted = db.deleted_channels();

    deleted.register(789, 456).await.unwrap();
    assert_eq!(deleted.get_category(789).await.unwrap(), Some(456));
    assert_eq!(deleted.get_category(999).await.unwrap(), None);
}

#[tokio::test]
async fn deleted_channel_last_write_wins() {
    let db = setup().await;
    let deleted = db.deleted_channels();

    deleted.register(789, 456).await.unwrap();
    deleted.register(789, 457).await.unwrap();
    assert_eq!(deleted.get_category(789).await.unwrap(), Some(457));
}

#[tokio::test]
async fn prune_respects_the_cutoff() {
    let db = setup().await;
    let deleted = db.deleted_channels();

    deleted.register(789, 456).await.unwrap();

    let kept = deleted
        .prune_older_than(Utc::now() - Duration::seconds(60))
        .await
        .unwrap();
    assert_eq!(kept, 0);
    assert_eq!(deleted.get_category(789).await.unwrap(), Some(456));

    let removed = deleted
        .prune_older_than(Utc::now() + Duration::seconds(60))
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert_eq!(deleted.get_category(789).await.unwrap(), None);
}

#[tokio::test]
async fn ensure_initialized_is_idempotent() {
    let db = setup().await;
    db.ensure_initialized().await.unwrap();
    db.ensure_initialized().await.unwrap();

    db.tracked().register(1, "src").await.unwrap();
    db.ensure_initialized().await.unwrap();
    assert!(db.tracked().is_tracked(1, "src").await.unwrap());
}

#[tokio::test]
async fn writes_survive_a_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("voice_logs.db");
    let path = path.to_str().unwrap();
    let when = at(2026, 8, 12, 10, 0);

    {
        let db = Database::open(path).await.unwrap();
        db.ensure_initialized().await.unwrap();
        db.tracked().register(12345, "test_source").await.unwrap();
        db.voice_time().add_time_at(1, 123, 3600, when).await.unwrap();
        db.deleted_channels().register(789, 456).await.unwrap();
        db.close().await;
    }

    let db = Database::open(path).await.unwrap();
    db.ensure_initialized().await.unwrap();

    let channels = db.tracked().get_tracked("test_source").await.unwrap();
    assert!(channels.contains(&12345));

    let totals = db
        .voice_time()
        .user_totals(123, Period::Daily, when)
        .await
        .unwrap();
    assert_eq!(totals.totals.get(&1), Some(&3600));

    assert_eq!(db.deleted_channels().get_category(789).await.unwrap(), Some(456));
    db.close().await;
}
