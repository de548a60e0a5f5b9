//! Event store operations for moisture readings.
//!
//! Readings are the system's only history. Each control-loop observation is
//! appended as one row, committed before the append returns, and never
//! touched again. The column names match stores written by earlier versions
//! of the controller so existing databases keep working.

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use irrigation_types::{Reading, RecordId, RelayPin, SensorChannel, StoredReading};
use sqlx::SqlitePool;

use crate::error::DbError;

/// Name of the readings table.
pub const TABLE_NAME: &str = "irrigation_system";

const CREATE_TABLE: &str = r"CREATE TABLE IF NOT EXISTS irrigation_system (
    id INTEGER PRIMARY KEY,
    date TIMESTAMP,
    relay_channel INTEGER,
    moisture_sensor_channel INTEGER,
    moisture INTEGER,
    wateringplants INTEGER
)";

/// Operations on the `irrigation_system` table.
pub struct EventStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> EventStore<'a> {
    /// Bind to `pool`, creating the readings table if it does not exist yet.
    ///
    /// Safe to call on every startup.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the schema check or creation fails.
    pub async fn open(pool: &'a SqlitePool) -> Result<Self, DbError> {
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), DbError> {
        let existing: Option<String> = sqlx::query_scalar(
            r"SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
        )
        .bind(TABLE_NAME)
        .fetch_optional(self.pool)
        .await?;

        if existing.is_none() {
            sqlx::query(CREATE_TABLE).execute(self.pool).await?;
            tracing::info!(table = TABLE_NAME, "Created readings table");
        }
        Ok(())
    }

    /// Append one reading and return its record id.
    ///
    /// The insert runs in autocommit mode, so the row is committed and
    /// visible to [`EventStore::recent`] once this returns.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the insert fails.
    pub async fn append(&self, reading: &Reading) -> Result<RecordId, DbError> {
        let result = sqlx::query(
            r"INSERT INTO irrigation_system (date, relay_channel, moisture_sensor_channel, moisture, wateringplants)
              VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(reading.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, false))
        .bind(i64::from(reading.relay_channel))
        .bind(i64::from(reading.sensor_channel))
        .bind(i64::from(reading.moisture))
        .bind(i64::from(reading.watering))
        .execute(self.pool)
        .await?;

        let id = RecordId(result.last_insert_rowid());
        tracing::debug!(
            id = %id,
            relay = %reading.relay_channel,
            sensor = %reading.sensor_channel,
            moisture = reading.moisture,
            watering = reading.watering,
            "Appended reading"
        );
        Ok(id)
    }

    /// Return up to `limit` of the most recent readings, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the query fails, or
    /// [`DbError::InvalidRow`] if a row holds values a reading cannot.
    pub async fn recent(&self, limit: u32) -> Result<Vec<StoredReading>, DbError> {
        let mut rows = sqlx::query_as::<_, ReadingRow>(
            r"SELECT id, date, relay_channel, moisture_sensor_channel, moisture, wateringplants
              FROM irrigation_system
              ORDER BY id DESC
              LIMIT ?1",
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await?;

        rows.reverse();
        rows.into_iter().map(StoredReading::try_from).collect()
    }

    /// Total number of readings ever appended.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the query fails.
    pub async fn count(&self) -> Result<u64, DbError> {
        let count: i64 = sqlx::query_scalar(r"SELECT COUNT(*) FROM irrigation_system")
            .fetch_one(self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

/// A row from the `irrigation_system` table.
///
/// Integer columns are read as `i64` and narrowed when converted into a
/// [`StoredReading`], so rows written by other tools are checked rather
/// than silently truncated.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReadingRow {
    /// Auto-assigned row id.
    pub id: i64,
    /// Capture time as stored: RFC 3339, or naive local time in rows written
    /// by older controllers.
    pub date: String,
    /// Relay pin.
    pub relay_channel: i64,
    /// ADC input.
    pub moisture_sensor_channel: i64,
    /// Raw sample.
    pub moisture: i64,
    /// Watering flag (0 or 1).
    pub wateringplants: i64,
}

impl TryFrom<ReadingRow> for StoredReading {
    type Error = DbError;

    fn try_from(row: ReadingRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let invalid = |column: &str, value: i64| DbError::InvalidRow {
            id,
            message: format!("{column} = {value} is out of range"),
        };

        let relay = u8::try_from(row.relay_channel)
            .ok()
            .ok_or_else(|| invalid("relay_channel", row.relay_channel))?;
        let sensor = u8::try_from(row.moisture_sensor_channel)
            .ok()
            .ok_or_else(|| invalid("moisture_sensor_channel", row.moisture_sensor_channel))?;
        let moisture = u16::try_from(row.moisture)
            .ok()
            .ok_or_else(|| invalid("moisture", row.moisture))?;

        let timestamp = parse_timestamp(id, &row.date)?;

        Ok(Self {
            id: RecordId(id),
            reading: Reading {
                timestamp,
                relay_channel: RelayPin(relay),
                sensor_channel: SensorChannel(sensor),
                moisture,
                watering: row.wateringplants != 0,
            },
        })
    }
}

/// Layouts of the naive timestamps older controllers wrote.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Decode a `date` column value.
///
/// Values with an offset are taken as written. Naive values were captured
/// with the controller's local clock and are interpreted in the local zone;
/// an ambiguous wall time (DST fall-back) resolves to the earlier instant.
fn parse_timestamp(id: i64, text: &str) -> Result<DateTime<Utc>, DbError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| DbError::InvalidRow {
            id,
            message: format!("date = {text:?} is not a timestamp"),
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use chrono::NaiveDate;

    use super::*;

    fn row(moisture: i64) -> ReadingRow {
        ReadingRow {
            id: 7,
            date: "1970-01-01T00:00:00+00:00".to_owned(),
            relay_channel: 26,
            moisture_sensor_channel: 0,
            moisture,
            wateringplants: 1,
        }
    }

    #[test]
    fn row_converts_to_reading() {
        let stored = StoredReading::try_from(row(850));
        let stored = stored.ok();
        assert_eq!(stored.map(|s| s.id), Some(RecordId(7)));
        assert_eq!(stored.map(|s| s.reading.moisture), Some(850));
        assert_eq!(stored.map(|s| s.reading.watering), Some(true));
        assert_eq!(stored.map(|s| s.reading.relay_channel), Some(RelayPin(26)));
    }

    #[test]
    fn negative_moisture_is_rejected() {
        let result = StoredReading::try_from(row(-1));
        assert!(matches!(result, Err(DbError::InvalidRow { id: 7, .. })));
    }

    #[test]
    fn offset_timestamps_are_taken_as_written() {
        let ts = parse_timestamp(1, "2021-05-02T09:30:00.250+02:00").expect("parses");
        let expected = Utc
            .with_ymd_and_hms(2021, 5, 2, 7, 30, 0)
            .single()
            .expect("valid date")
            + chrono::Duration::milliseconds(250);
        assert_eq!(ts, expected);
    }

    #[test]
    fn naive_timestamps_are_local_time() {
        let naive = NaiveDate::from_ymd_opt(2021, 5, 2)
            .and_then(|d| d.and_hms_micro_opt(7, 30, 0, 250_000))
            .expect("valid date");
        let expected = Local
            .from_local_datetime(&naive)
            .earliest()
            .expect("local time exists")
            .with_timezone(&Utc);

        for text in ["2021-05-02 07:30:00.250000", "2021-05-02T07:30:00.25"] {
            assert_eq!(parse_timestamp(1, text).expect("parses"), expected, "{text}");
        }
    }

    #[test]
    fn appended_timestamps_decode_unchanged() {
        let now = Utc::now();
        let text = now.to_rfc3339_opts(SecondsFormat::AutoSi, false);
        assert_eq!(parse_timestamp(1, &text).expect("parses"), now);
    }

    #[test]
    fn unparseable_date_is_rejected() {
        let mut bad = row(500);
        bad.date = "yesterday".to_owned();
        let result = StoredReading::try_from(bad);
        assert!(matches!(result, Err(DbError::InvalidRow { id: 7, .. })));
    }
}
