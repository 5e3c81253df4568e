//! CSV ingestion into a [`LocalRepository`].
//!
//! Expected files in the data directory:
//!
//! | file               | columns                                                   | required |
//! |--------------------|-----------------------------------------------------------|----------|
//! | `store_status.csv` | `store_id,status,timestamp_utc`                           | yes      |
//! | `menu_hours.csv`   | `store_id,dayOfWeek,start_time_local,end_time_local`      | no       |
//! | `timezones.csv`    | `store_id,timezone_str`                                   | no       |
//!
//! Every column is read as a string and parsed here, so a malformed row is
//! reported with its line number instead of being coerced by type inference.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use polars::prelude::*;
use std::path::{Path, PathBuf};

use crate::db::repositories::LocalRepository;
use crate::models::{BusinessHoursRule, Observation, StoreStatus, TimezoneAssignment};

pub const STORE_STATUS_FILE: &str = "store_status.csv";
pub const MENU_HOURS_FILE: &str = "menu_hours.csv";
pub const TIMEZONES_FILE: &str = "timezones.csv";

/// Errors raised while loading CSV input.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Required file not found: {0}")]
    MissingFile(PathBuf),

    #[error("{file}: missing column '{column}'")]
    MissingColumn { file: String, column: String },

    #[error("{file} line {line}: {message}")]
    InvalidRow {
        file: String,
        line: usize,
        message: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] PolarsError),
}

/// Row counts loaded by [`ingest_directory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub observations: usize,
    pub business_hours: usize,
    pub timezones: usize,
}

/// Load the three input files from `dir` into `repo`.
///
/// `store_status.csv` must exist. A missing hours file leaves every store open
/// 24/7; a missing timezone file leaves every store on the default timezone.
pub fn ingest_directory(repo: &LocalRepository, dir: &Path) -> Result<IngestSummary, IngestError> {
    let status_path = dir.join(STORE_STATUS_FILE);
    if !status_path.exists() {
        return Err(IngestError::MissingFile(status_path));
    }

    let observations = read_store_status(&status_path)?;
    let mut summary = IngestSummary {
        observations: observations.len(),
        ..Default::default()
    };
    repo.add_observations(observations);

    let hours_path = dir.join(MENU_HOURS_FILE);
    if hours_path.exists() {
        let rules = read_menu_hours(&hours_path)?;
        summary.business_hours = rules.len();
        repo.add_business_hours(rules);
    } else {
        log::warn!(
            "{} not found, all stores treated as open 24/7",
            hours_path.display()
        );
    }

    let tz_path = dir.join(TIMEZONES_FILE);
    if tz_path.exists() {
        let assignments = read_timezones(&tz_path)?;
        summary.timezones = assignments.len();
        for assignment in assignments {
            repo.set_timezone(assignment);
        }
    } else {
        log::warn!(
            "{} not found, all stores use the default timezone",
            tz_path.display()
        );
    }

    log::info!(
        "Ingested {} observations, {} business-hours rules, {} timezones from {}",
        summary.observations,
        summary.business_hours,
        summary.timezones,
        dir.display()
    );
    Ok(summary)
}

/// Parse `store_status.csv`.
pub fn read_store_status(path: &Path) -> Result<Vec<Observation>, IngestError> {
    let df = read_csv(path)?;
    let file = file_label(path);

    let ids = string_column(&df, &file, "store_id")?;
    let statuses = string_column(&df, &file, "status")?;
    let timestamps = string_column(&df, &file, "timestamp_utc")?;

    let mut observations = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let line = i + 2;
        let store_id = required(ids.get(i), &file, line, "store_id")?;
        let status: StoreStatus = required(statuses.get(i), &file, line, "status")?
            .parse()
            .map_err(|message| invalid(&file, line, message))?;
        let raw_ts = required(timestamps.get(i), &file, line, "timestamp_utc")?;
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| {
            invalid(&file, line, format!("Invalid timestamp '{}'", raw_ts))
        })?;

        observations.push(Observation::new(store_id, timestamp, status));
    }
    Ok(observations)
}

/// Parse `menu_hours.csv`. `dayOfWeek` is 0 for Monday through 6 for Sunday.
pub fn read_menu_hours(path: &Path) -> Result<Vec<BusinessHoursRule>, IngestError> {
    let df = read_csv(path)?;
    let file = file_label(path);

    let ids = string_column(&df, &file, "store_id")?;
    let days = string_column(&df, &file, "dayOfWeek")?;
    let starts = string_column(&df, &file, "start_time_local")?;
    let ends = string_column(&df, &file, "end_time_local")?;

    let mut rules = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let line = i + 2;
        let store_id = required(ids.get(i), &file, line, "store_id")?;
        let raw_day = required(days.get(i), &file, line, "dayOfWeek")?;
        let day: u8 = raw_day
            .trim()
            .parse()
            .map_err(|_| invalid(&file, line, format!("Invalid dayOfWeek '{}'", raw_day)))?;
        let start = parse_local_time(required(starts.get(i), &file, line, "start_time_local")?)
            .ok_or_else(|| invalid(&file, line, "Invalid start_time_local"))?;
        let end = parse_local_time(required(ends.get(i), &file, line, "end_time_local")?)
            .ok_or_else(|| invalid(&file, line, "Invalid end_time_local"))?;

        let rule = BusinessHoursRule::from_day_index(store_id, day, start, end)
            .map_err(|message| invalid(&file, line, message))?;
        rules.push(rule);
    }
    Ok(rules)
}

/// Parse `timezones.csv`. Names are kept verbatim and resolved per store.
pub fn read_timezones(path: &Path) -> Result<Vec<TimezoneAssignment>, IngestError> {
    let df = read_csv(path)?;
    let file = file_label(path);

    let ids = string_column(&df, &file, "store_id")?;
    let names = string_column(&df, &file, "timezone_str")?;

    let mut assignments = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let line = i + 2;
        let store_id = required(ids.get(i), &file, line, "store_id")?;
        let name = required(names.get(i), &file, line, "timezone_str")?;
        assignments.push(TimezoneAssignment::new(store_id, name.trim()));
    }
    Ok(assignments)
}

/// Parse a poll timestamp.
///
/// Accepts `2023-01-22 12:09:39.388884 UTC` (fractional seconds optional) and
/// RFC 3339.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    let naive = raw.strip_suffix("UTC").map(str::trim_end).unwrap_or(raw);

    if let Ok(dt) = NaiveDateTime::parse_from_str(naive, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_local_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

fn read_csv(path: &Path) -> Result<DataFrame, IngestError> {
    // Schema inference disabled: every column comes back as String
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.into()))?
        .finish()?;
    Ok(df)
}

fn string_column<'a>(
    df: &'a DataFrame,
    file: &str,
    name: &str,
) -> Result<&'a StringChunked, IngestError> {
    let column = df.column(name).map_err(|_| IngestError::MissingColumn {
        file: file.to_string(),
        column: name.to_string(),
    })?;
    Ok(column.str()?)
}

fn required<'a>(
    value: Option<&'a str>,
    file: &str,
    line: usize,
    column: &str,
) -> Result<&'a str, IngestError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(invalid(file, line, format!("Missing value for '{}'", column))),
    }
}

fn invalid(file: &str, line: usize, message: impl Into<String>) -> IngestError {
    IngestError::InvalidRow {
        file: file.to_string(),
        line,
        message: message.into(),
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Weekday};
    use std::fs;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2023, 1, 22, 12, 9, 39).unwrap();

        let with_micros = parse_timestamp("2023-01-22 12:09:39.388884 UTC").unwrap();
        assert_eq!(with_micros.timestamp(), expected.timestamp());
        assert_eq!(with_micros.timestamp_subsec_micros(), 388_884);

        assert_eq!(parse_timestamp("2023-01-22 12:09:39 UTC"), Some(expected));
        assert_eq!(parse_timestamp("2023-01-22T12:09:39Z"), Some(expected));
        assert_eq!(parse_timestamp("2023-01-22T07:09:39-05:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_read_store_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORE_STATUS_FILE);
        fs::write(
            &path,
            "store_id,status,timestamp_utc\n\
             8419537941919820732,active,2023-01-22 12:09:39.388884 UTC\n\
             8419537941919820732,INACTIVE,2023-01-24 09:06:42.605777 UTC\n",
        )
        .unwrap();

        let obs = read_store_status(&path).unwrap();
        assert_eq!(obs.len(), 2);
        // numeric ids survive as text
        assert_eq!(obs[0].store_id.as_str(), "8419537941919820732");
        assert_eq!(obs[1].status, StoreStatus::Inactive);
    }

    #[test]
    fn test_bad_status_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORE_STATUS_FILE);
        fs::write(
            &path,
            "store_id,status,timestamp_utc\n\
             s1,active,2023-01-22 12:00:00 UTC\n\
             s1,sleeping,2023-01-22 13:00:00 UTC\n",
        )
        .unwrap();

        match read_store_status(&path) {
            Err(IngestError::InvalidRow { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected InvalidRow, got {:?}", other),
        }
    }

    #[test]
    fn test_read_menu_hours() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MENU_HOURS_FILE);
        fs::write(
            &path,
            "store_id,dayOfWeek,start_time_local,end_time_local\n\
             s1,0,09:00:00,17:00:00\n\
             s1,6,22:00:00,02:00:00\n",
        )
        .unwrap();

        let rules = read_menu_hours(&path).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].weekday, Weekday::Mon);
        assert_eq!(rules[1].weekday, Weekday::Sun);
        assert!(rules[1].is_overnight());
    }

    #[test]
    fn test_menu_hours_rejects_bad_day() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MENU_HOURS_FILE);
        fs::write(
            &path,
            "store_id,dayOfWeek,start_time_local,end_time_local\ns1,7,09:00:00,17:00:00\n",
        )
        .unwrap();

        assert!(matches!(
            read_menu_hours(&path),
            Err(IngestError::InvalidRow { line: 2, .. })
        ));
    }

    #[test]
    fn test_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TIMEZONES_FILE);
        fs::write(&path, "store_id,tz\ns1,Asia/Tokyo\n").unwrap();

        assert!(matches!(
            read_timezones(&path),
            Err(IngestError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_ingest_directory_with_optional_files_missing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(STORE_STATUS_FILE),
            "store_id,status,timestamp_utc\ns1,active,2023-01-22 12:00:00 UTC\n",
        )
        .unwrap();

        let repo = LocalRepository::new();
        let summary = ingest_directory(&repo, dir.path()).unwrap();

        assert_eq!(summary.observations, 1);
        assert_eq!(summary.business_hours, 0);
        assert_eq!(summary.timezones, 0);
        assert_eq!(repo.observation_count(), 1);
    }

    #[test]
    fn test_ingest_directory_requires_status_file() {
        let dir = tempfile::tempdir().unwrap();
        let repo = LocalRepository::new();
        assert!(matches!(
            ingest_directory(&repo, dir.path()),
            Err(IngestError::MissingFile(_))
        ));
    }
}
