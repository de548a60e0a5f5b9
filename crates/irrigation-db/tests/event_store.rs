//! Integration tests for the readings event store.
//!
//! Each test runs against its own in-memory `SQLite` database, so no files
//! are created and tests can run in parallel.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]

use chrono::{Duration, Local, NaiveDate, TimeZone, Utc};
use irrigation_db::{DatabaseConfig, DatabasePool, DbError, EventStore, TABLE_NAME};
use irrigation_types::{Reading, RecordId, RelayPin, SensorChannel};

async fn memory_pool() -> DatabasePool {
    DatabasePool::connect(&DatabaseConfig::in_memory())
        .await
        .expect("in-memory database opens")
}

fn reading(seq: i64, moisture: u16) -> Reading {
    let base = Utc.with_ymd_and_hms(2026, 6, 1, 6, 0, 0).single().expect("valid date");
    Reading {
        timestamp: base + Duration::minutes(seq) + Duration::microseconds(123_456),
        relay_channel: RelayPin(26),
        sensor_channel: SensorChannel(0),
        moisture,
        watering: moisture > 800,
    }
}

#[tokio::test]
async fn append_then_recent_returns_same_reading() {
    let db = memory_pool().await;
    let store = EventStore::open(db.pool()).await.expect("schema created");

    let original = reading(0, 850);
    let id = store.append(&original).await.expect("append succeeds");

    let recent = store.recent(1).await.expect("query succeeds");
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, id);
    assert_eq!(recent[0].reading, original);
}

#[tokio::test]
async fn ids_increase_in_insertion_order() {
    let db = memory_pool().await;
    let store = EventStore::open(db.pool()).await.expect("schema created");

    let mut last = RecordId(0);
    for seq in 0..5 {
        let id = store.append(&reading(seq, 300)).await.expect("append succeeds");
        assert!(id > last, "{id} should follow {last}");
        last = id;
    }
}

#[tokio::test]
async fn recent_returns_newest_window_oldest_first() {
    let db = memory_pool().await;
    let store = EventStore::open(db.pool()).await.expect("schema created");

    for seq in 0..15 {
        let moisture = u16::try_from(100 + seq).expect("small value");
        store
            .append(&reading(seq, moisture))
            .await
            .expect("append succeeds");
    }

    let window = store.recent(10).await.expect("query succeeds");
    let moistures: Vec<u16> = window.iter().map(|s| s.reading.moisture).collect();
    assert_eq!(moistures, (105..115).collect::<Vec<u16>>());
    assert!(window.windows(2).all(|w| w[0].id < w[1].id));
}

#[tokio::test]
async fn recent_is_bounded_by_limit_and_total() {
    let db = memory_pool().await;
    let store = EventStore::open(db.pool()).await.expect("schema created");

    assert!(store.recent(10).await.expect("query succeeds").is_empty());

    for seq in 0..3 {
        store.append(&reading(seq, 500)).await.expect("append succeeds");
    }

    assert_eq!(store.recent(0).await.expect("query succeeds").len(), 0);
    assert_eq!(store.recent(2).await.expect("query succeeds").len(), 2);
    assert_eq!(store.recent(10).await.expect("query succeeds").len(), 3);
    assert_eq!(store.count().await.expect("count succeeds"), 3);
}

#[tokio::test]
async fn open_is_idempotent_and_keeps_rows() {
    let db = memory_pool().await;

    {
        let store = EventStore::open(db.pool()).await.expect("schema created");
        store.append(&reading(0, 900)).await.expect("append succeeds");
    }

    let store = EventStore::open(db.pool()).await.expect("second open succeeds");
    assert_eq!(store.count().await.expect("count succeeds"), 1);

    let tables: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
    )
    .bind(TABLE_NAME)
    .fetch_one(db.pool())
    .await
    .expect("catalog query succeeds");
    assert_eq!(tables, 1);
}

#[tokio::test]
async fn reads_rows_written_by_older_controllers() {
    let db = memory_pool().await;
    let store = EventStore::open(db.pool()).await.expect("schema created");

    // Earlier controllers stored naive local timestamps as text.
    sqlx::query(
        "INSERT INTO irrigation_system (date, relay_channel, moisture_sensor_channel, moisture, wateringplants)
         VALUES ('2021-05-02 07:30:00.250000', 26, 0, 812, 1)",
    )
    .execute(db.pool())
    .await
    .expect("legacy insert succeeds");

    let rows = store.recent(1).await.expect("query succeeds");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].reading.moisture, 812);
    assert!(rows[0].reading.watering);
    assert_eq!(rows[0].reading.relay_channel, RelayPin(26));

    let captured = NaiveDate::from_ymd_opt(2021, 5, 2)
        .and_then(|d| d.and_hms_micro_opt(7, 30, 0, 250_000))
        .expect("valid date");
    let expected = Local
        .from_local_datetime(&captured)
        .earliest()
        .expect("local time exists")
        .with_timezone(&Utc);
    assert_eq!(rows[0].reading.timestamp, expected);
    assert_eq!(
        rows[0].reading.timestamp.with_timezone(&Local).naive_local(),
        captured
    );
}

#[tokio::test]
async fn garbage_date_is_reported() {
    let db = memory_pool().await;
    let store = EventStore::open(db.pool()).await.expect("schema created");

    sqlx::query(
        "INSERT INTO irrigation_system (date, relay_channel, moisture_sensor_channel, moisture, wateringplants)
         VALUES ('not a date', 26, 0, 500, 0)",
    )
    .execute(db.pool())
    .await
    .expect("raw insert succeeds");

    let result = store.recent(1).await;
    assert!(matches!(result, Err(DbError::InvalidRow { .. })));
}

#[tokio::test]
async fn out_of_range_row_is_reported() {
    let db = memory_pool().await;
    let store = EventStore::open(db.pool()).await.expect("schema created");

    sqlx::query(
        "INSERT INTO irrigation_system (date, relay_channel, moisture_sensor_channel, moisture, wateringplants)
         VALUES ('2021-05-02T07:30:00+00:00', 26, 0, -5, 0)",
    )
    .execute(db.pool())
    .await
    .expect("raw insert succeeds");

    let result = store.recent(1).await;
    assert!(matches!(result, Err(DbError::InvalidRow { .. })));
}

#[tokio::test]
async fn append_after_close_fails() {
    let db = memory_pool().await;
    let store = EventStore::open(db.pool()).await.expect("schema created");
    db.close().await;

    let result = store.append(&reading(0, 850)).await;
    assert!(matches!(result, Err(DbError::Sqlite(_))));
}
