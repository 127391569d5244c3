//! CSV input for raw wind observations

use crate::error::{Result, WindError};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::path::Path;
use tracing::debug;

use super::RawObservation;

/// Columns every input file must carry
pub const REQUIRED_COLUMNS: [&str; 3] = ["time", "uwnd", "vwnd"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Parse an ISO-style date or timestamp.
///
/// Offsets are normalized to UTC; plain dates map to midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Read a CSV file with `time`, `uwnd`, `vwnd` columns
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(WindError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("input file not found: {}", path.display()),
        )));
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    debug!(path = %path.display(), rows = df.height(), cols = df.width(), "Loaded CSV");
    Ok(df)
}

/// Load raw observations from a CSV file; extra columns are ignored
pub fn load_observations(path: &Path) -> Result<Vec<RawObservation>> {
    let df = load_csv(path)?;
    observations_from_frame(&df)
}

/// Convert a frame into raw observations.
///
/// Fails with `SchemaError` when a required column is absent or a time or wind
/// value cannot be parsed, and with `MissingFieldError` when a wind component is null.
pub fn observations_from_frame(df: &DataFrame) -> Result<Vec<RawObservation>> {
    for name in REQUIRED_COLUMNS {
        if df.column(name).is_err() {
            return Err(WindError::SchemaError(format!(
                "required column `{}` is missing",
                name
            )));
        }
    }

    let times = df.column("time")?.cast(&DataType::String)?;
    let times = times.str()?;
    let uwnd = float_column(df, "uwnd")?;
    let vwnd = float_column(df, "vwnd")?;

    times
        .into_iter()
        .zip(uwnd)
        .zip(vwnd)
        .enumerate()
        .map(|(row, ((time, u), v))| {
            let raw_time = time.ok_or_else(|| {
                WindError::SchemaError(format!("row {}: `time` is empty", row))
            })?;
            let time = parse_timestamp(raw_time).ok_or_else(|| {
                WindError::SchemaError(format!(
                    "row {}: cannot parse `time` value {:?}",
                    row, raw_time
                ))
            })?;
            let uwnd = u.ok_or_else(|| WindError::MissingFieldError {
                field: "uwnd".to_string(),
                row,
            })?;
            let vwnd = v.ok_or_else(|| WindError::MissingFieldError {
                field: "vwnd".to_string(),
                row,
            })?;
            Ok(RawObservation::new(time, uwnd, vwnd))
        })
        .collect()
}

/// Numeric values of `name`; a present but non-numeric cell is a schema error
fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let original = df.column(name)?;
    let values: Vec<Option<f64>> = original.cast(&DataType::Float64)?.f64()?.into_iter().collect();

    let unparsed = values
        .iter()
        .zip(original.is_null().into_iter())
        .position(|(value, was_null)| value.is_none() && was_null == Some(false));
    if let Some(row) = unparsed {
        let raw = original
            .get(row)
            .map(|v| v.to_string())
            .unwrap_or_default();
        return Err(WindError::SchemaError(format!(
            "row {}: `{}` value {} is not a number",
            row, name, raw
        )));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_plain_date() {
        let t = parse_timestamp("2016-02-29").unwrap();
        assert_eq!((t.year(), t.month(), t.day()), (2016, 2, 29));
        assert_eq!(t.hour(), 0);
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("2020-05-01 12:30:00").is_some());
        assert!(parse_timestamp("2020-05-01T12:30:00").is_some());
        assert!(parse_timestamp("2020-05-01 12:30:00.000000").is_some());
        assert!(parse_timestamp("2020-05-01T12:30:00Z").is_some());
        assert!(parse_timestamp(" 2020/05/01 ").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_rfc3339_normalized_to_utc() {
        let t = parse_timestamp("2020-05-01T02:00:00+03:00").unwrap();
        assert_eq!((t.day(), t.hour()), (30, 23));
    }

    #[test]
    fn test_frame_missing_column() {
        let df = df!(
            "time" => &["2020-01-01", "2020-01-02"],
            "uwnd" => &[1.0, 2.0]
        )
        .unwrap();
        let err = observations_from_frame(&df).unwrap_err();
        assert!(matches!(err, WindError::SchemaError(ref m) if m.contains("vwnd")));
    }

    #[test]
    fn test_frame_null_component() {
        let df = df!(
            "time" => &["2020-01-01", "2020-01-02"],
            "uwnd" => &[Some(1.0), None],
            "vwnd" => &[1.0, 2.0]
        )
        .unwrap();
        let err = observations_from_frame(&df).unwrap_err();
        assert!(matches!(err, WindError::MissingFieldError { row: 1, .. }));
    }

    #[test]
    fn test_non_numeric_component() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wind.csv");
        std::fs::write(&path, "time,uwnd,vwnd\n2020-01-01,1.0,2.0\n2020-01-02,abc,2.0\n").unwrap();

        let err = load_observations(&path).unwrap_err();
        assert!(
            matches!(err, WindError::SchemaError(ref m) if m.contains("row 1") && m.contains("uwnd")),
            "{}",
            err
        );
    }

    #[test]
    fn test_empty_cell_is_missing_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wind.csv");
        std::fs::write(&path, "time,uwnd,vwnd\n2020-01-01,1.0,2.0\n2020-01-02,1.5,\n").unwrap();

        let err = load_observations(&path).unwrap_err();
        assert!(matches!(err, WindError::MissingFieldError { ref field, row: 1 } if field == "vwnd"));
    }

    #[test]
    fn test_frame_ignores_extra_columns() {
        let df = df!(
            "time" => &["2020-01-02", "2020-01-01"],
            "uwnd" => &[3.0, 1.0],
            "vwnd" => &[4.0, 1.0],
            "station" => &["a", "b"]
        )
        .unwrap();
        let obs = observations_from_frame(&df).unwrap();
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[0].uwnd, 3.0);
    }
}
