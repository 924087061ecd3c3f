/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Forecast CSV reader.
//!
//! Expected header (extra columns such as `curtailment_MW` are ignored):
//! ```text
//! datetime,forecast_MW,actual_MW
//! 2023-06-01 00:00:00,12.5,11.0
//! ```
//! Empty power cells are read as missing values, and so is `NaN`.  An
//! infinite `actual_MW` is an error.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use super::parse_timestamp;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why a forecast series could not be turned into a timeline.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The CSV layer could not read or decode a record.
    #[error("malformed forecast record {record}: {source}")]
    Csv {
        record: usize,
        #[source]
        source: csv::Error,
    },

    /// The `datetime` column of a record is not a timestamp.
    #[error("forecast record {record}: cannot parse datetime '{value}'")]
    BadTimestamp { record: usize, value: String },

    /// A row does not fall on the slot grid fixed by the first row.
    #[error("forecast row at {timestamp} is not aligned to the {slot_minutes}-minute slot grid")]
    MisalignedTimestamp {
        timestamp: NaiveDateTime,
        slot_minutes: i64,
    },

    /// Two rows map to the same slot.
    #[error("forecast has more than one row for slot {timestamp}")]
    DuplicateSlot { timestamp: NaiveDateTime },

    /// The `actual_MW` column of a record holds an infinite value.
    #[error("forecast record {record}: actual_MW must be finite (got {value})")]
    NonFinitePower { record: usize, value: f64 },

    /// Too many consecutive slots are missing to fill them with 0 MW.
    #[error("forecast has no rows from {after} to {before} ({missing_slots} slots)")]
    GapTooLong {
        after: NaiveDateTime,
        before: NaiveDateTime,
        missing_slots: usize,
    },

    #[error("slot duration must be at least 1 ms (got {millis} ms)")]
    InvalidSlotDuration { millis: i64 },
}

// ── Rows ──────────────────────────────────────────────────────────────────────

/// One row of the power forecast series.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRow {
    pub datetime: NaiveDateTime,
    /// Forecast generation in MW.  Informational only.
    pub forecast_mw: Option<f64>,
    /// Realised generation in MW.  This is what the timeline consumes.
    pub actual_mw: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawForecastRow {
    datetime: String,
    #[serde(rename = "forecast_MW", default)]
    forecast_mw: Option<f64>,
    #[serde(rename = "actual_MW", default)]
    actual_mw: Option<f64>,
}

/// Read every forecast row from `reader`.
///
/// Records are numbered from 1 (the header is not counted) in errors.
pub fn read_forecast<R: Read>(reader: R) -> Result<Vec<ForecastRow>, ForecastError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut rows = Vec::new();
    for (i, result) in csv_reader.deserialize::<RawForecastRow>().enumerate() {
        let record = i + 1;
        let raw = result.map_err(|source| ForecastError::Csv { record, source })?;
        let datetime =
            parse_timestamp(&raw.datetime).ok_or_else(|| ForecastError::BadTimestamp {
                record,
                value: raw.datetime.clone(),
            })?;
        let actual_mw = match raw.actual_mw {
            Some(value) if value.is_infinite() => {
                return Err(ForecastError::NonFinitePower { record, value });
            }
            Some(value) if value.is_nan() => None,
            other => other,
        };
        rows.push(ForecastRow {
            datetime,
            forecast_mw: raw.forecast_mw,
            actual_mw,
        });
    }
    Ok(rows)
}

/// Open `path` and read the forecast series from it.
///
/// # Errors
/// Fails if the file cannot be opened or any record is malformed; the path is
/// always part of the error chain.
pub fn load_forecast_csv(path: &Path) -> Result<Vec<ForecastRow>> {
    info!("Loading power forecast from: {}", path.display());

    let file = std::fs::File::open(path)
        .with_context(|| format!("Cannot open forecast file: {}", path.display()))?;
    let rows = read_forecast(file)
        .with_context(|| format!("Failed to read forecast file: {}", path.display()))?;

    info!(rows = rows.len(), "forecast loaded");
    Ok(rows)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
datetime,forecast_MW,actual_MW,curtailment_MW
2023-06-01 00:00:00,10.0,8.5,1.5
2023-06-01 00:30:00,12.0,,
2023-06-01 01:00:00,,-1.0,
";

    #[test]
    fn reads_rows_and_ignores_extra_columns() {
        let rows = read_forecast(SAMPLE.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].datetime.to_string(), "2023-06-01 00:00:00");
        assert_eq!(rows[0].forecast_mw, Some(10.0));
        assert_eq!(rows[0].actual_mw, Some(8.5));
        assert_eq!(rows[1].actual_mw, None);
        assert_eq!(rows[2].forecast_mw, None);
        assert_eq!(rows[2].actual_mw, Some(-1.0));
    }

    #[test]
    fn bad_timestamp_names_the_record() {
        let csv = "datetime,forecast_MW,actual_MW\n2023-06-01 00:00:00,1,1\nnoon,1,1\n";
        let err = read_forecast(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ForecastError::BadTimestamp { record: 2, .. }));
        assert!(err.to_string().contains("noon"));
    }

    #[test]
    fn non_numeric_power_is_a_csv_error() {
        let csv = "datetime,forecast_MW,actual_MW\n2023-06-01 00:00:00,1,lots\n";
        let err = read_forecast(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ForecastError::Csv { record: 1, .. }));
    }

    #[test]
    fn infinite_actual_power_names_the_record() {
        let csv = "datetime,forecast_MW,actual_MW\n\
                   2023-06-01 00:00:00,1,1\n\
                   2023-06-01 00:30:00,1,inf\n";
        let err = read_forecast(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::NonFinitePower { record: 2, value } if value == f64::INFINITY
        ));
    }

    #[test]
    fn nan_actual_power_reads_as_missing() {
        let csv = "datetime,forecast_MW,actual_MW\n2023-06-01 00:00:00,1,NaN\n";
        let rows = read_forecast(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].actual_mw, None);
    }

    #[test]
    fn load_from_file_round_trips_into_timeline() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(SAMPLE.as_bytes()).unwrap();

        let rows = load_forecast_csv(f.path()).unwrap();
        let tl =
            crate::timeline::PowerTimeline::from_forecast(rows, chrono::Duration::minutes(30))
                .unwrap();
        assert_eq!(tl.len(), 3);
        assert_eq!(tl.available_power(0), Some(8.5));
        assert_eq!(tl.available_power(1), Some(0.0));
        assert_eq!(tl.available_power(2), Some(0.0));
    }

    #[test]
    fn missing_file_error_names_the_path() {
        let err = load_forecast_csv(Path::new("/nonexistent/forecast.csv")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/forecast.csv"));
    }
}
