//! Console presentation.
//!
//! Per-zone status lines printed as the cycle runs, and the fixed-width
//! history table printed at the end. The layout matches what operators of the
//! controller already read on their terminals, so column widths are fixed.

use core::fmt;

use chrono::{Local, TimeZone};
use irrigation_types::{Reading, StoredReading};

use crate::classifier::Moisture;

/// ANSI bright blue used for labels.
const LABEL: &str = "\x1b[94m";
/// ANSI reset.
const RESET: &str = "\x1b[0m";

/// Width between the outer borders of the history table.
const TABLE_WIDTH: usize = 102;

/// Timestamp layout in the history table.
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// `Relay Channel: <pin> Moisture Sensor Channel: <ch> Moisture Level: <v>`.
///
/// With `color`, each label is wrapped in ANSI escapes.
pub fn status_line(reading: &Reading, color: bool) -> String {
    let fields = [
        ("Relay Channel:", reading.relay_channel.to_string()),
        ("Moisture Sensor Channel:", reading.sensor_channel.to_string()),
        ("Moisture Level:", reading.moisture.to_string()),
    ];
    fields
        .iter()
        .map(|(label, value)| {
            if color {
                format!("{LABEL} {label} {RESET} {value}")
            } else {
                format!("{label} {value}")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `It is Dry    Watering now...` or `It is Moist`.
pub fn decision_line(reading: &Reading, color: bool) -> String {
    let state = Moisture::from_decision(reading.watering);
    let mut line = if color {
        format!("{LABEL} It is {state} {RESET}")
    } else {
        format!("It is {state}")
    };
    if reading.watering {
        line.push_str("    Watering now...");
    }
    line
}

/// Render `rows` as the history table, timestamps in local time.
pub fn history_table(rows: &[StoredReading]) -> String {
    HistoryTable::new(rows, Local).to_string()
}

/// The history table, rendered through [`fmt::Display`].
///
/// Rows are printed in the order given; callers pass the window returned by
/// `EventStore::recent`, which is already oldest first.
#[derive(Debug, Clone, Copy)]
pub struct HistoryTable<'a, Tz> {
    rows: &'a [StoredReading],
    tz: Tz,
}

impl<'a, Tz> HistoryTable<'a, Tz>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    /// Table over `rows`, with timestamps shown in `tz`.
    pub const fn new(rows: &'a [StoredReading], tz: Tz) -> Self {
        Self { rows, tz }
    }
}

impl<Tz> fmt::Display for HistoryTable<'_, Tz>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(TABLE_WIDTH);

        writeln!(f, ".{rule}.")?;
        writeln!(
            f,
            "|{:^9}|{:^31}|{:^10}|{:^17}|{:^10}|{:^20}|",
            "ID", "Date", "Relay", "Moisture Sensor", "Moisture", "Watering Plants"
        )?;
        writeln!(f, "|{rule}|")?;

        for row in self.rows {
            let reading = &row.reading;
            let date = reading
                .timestamp
                .with_timezone(&self.tz)
                .format(DATE_FORMAT)
                .to_string();
            writeln!(
                f,
                "|{:>8} |   {:<28}|{:>6}    |{:>10}       |{:>7}   |{:>10}          |",
                row.id,
                date,
                reading.relay_channel,
                reading.sensor_channel,
                reading.moisture,
                u8::from(reading.watering),
            )?;
        }

        write!(f, "`{rule}`")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::indexing_slicing)]

    use super::*;
    use chrono::Utc;
    use irrigation_types::{RecordId, RelayPin, SensorChannel};

    fn reading(moisture: u16) -> Reading {
        Reading {
            timestamp: Utc
                .with_ymd_and_hms(2021, 5, 2, 7, 30, 0)
                .single()
                .expect("valid date")
                + chrono::Duration::milliseconds(250),
            relay_channel: RelayPin(26),
            sensor_channel: SensorChannel(0),
            moisture,
            watering: moisture > 800,
        }
    }

    #[test]
    fn plain_status_lines() {
        let dry = reading(850);
        assert_eq!(
            status_line(&dry, false),
            "Relay Channel: 26 Moisture Sensor Channel: 0 Moisture Level: 850"
        );
        assert_eq!(decision_line(&dry, false), "It is Dry    Watering now...");
        assert_eq!(decision_line(&reading(300), false), "It is Moist");
    }

    #[test]
    fn colored_labels_are_wrapped() {
        let line = status_line(&reading(300), true);
        assert!(line.starts_with("\x1b[94m Relay Channel: \x1b[0m 26"));
        assert!(line.ends_with("Moisture Level: \x1b[0m 300"));
        assert_eq!(decision_line(&reading(300), true), "\x1b[94m It is Moist \x1b[0m");
    }

    #[test]
    fn table_layout() {
        let rows = [
            StoredReading {
                id: RecordId(1),
                reading: reading(850),
            },
            StoredReading {
                id: RecordId(2),
                reading: reading(300),
            },
        ];
        let table = HistoryTable::new(&rows, Utc).to_string();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 6);
        assert!(lines.iter().all(|l| l.chars().count() == TABLE_WIDTH + 2));
        assert_eq!(lines[0], format!(".{}.", "-".repeat(TABLE_WIDTH)));
        assert_eq!(
            lines[1],
            "|   ID    |             Date              |  Relay   | Moisture Sensor | Moisture |  Watering Plants   |"
        );
        assert_eq!(
            lines[3],
            "|       1 |   2021-05-02 07:30:00.250000  |    26    |         0       |    850   |         1          |"
        );
        assert!(lines[4].contains("|    300   |         0          |"));
        assert_eq!(lines[5], format!("`{}`", "-".repeat(TABLE_WIDTH)));
    }

    #[test]
    fn empty_table_has_header_only() {
        let table = HistoryTable::new(&[], Utc).to_string();
        assert_eq!(table.lines().count(), 4);
    }
}
