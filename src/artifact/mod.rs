use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

pub const EXTENSION: &str = "backup";

/// A backup file found in the backup directory.
///
/// Artifacts order by timestamp first and by filename for identical
/// timestamps, so a sorted catalog is the same on every run.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct BackupArtifact {
    pub timestamp: NaiveDateTime,
    pub filename: String,
}

/// Builds `[<app_name>-]<database>[-<identifier>]-<YYYYMMDD>-<HHMMSS>.backup`.
///
/// The app name is only prepended when the database name doesn't already
/// start with it.
pub fn compose(
    app_name: &str,
    database: &str,
    identifier: &str,
    timestamp: NaiveDateTime,
) -> String {
    let mut filename = String::from(database);
    if !identifier.is_empty() {
        filename.push('-');
        filename.push_str(identifier);
    }
    filename.push_str(&format!(
        "-{}.{}",
        timestamp.format("%Y%m%d-%H%M%S"),
        EXTENSION
    ));

    if !database.starts_with(app_name) {
        filename.insert_str(0, &format!("{}-", app_name));
    }

    filename
}

/// Parses a filename created by [`compose`] for the given app and database.
///
/// Returns `None` for everything else: other extensions, other databases,
/// malformed or impossible timestamps.
pub fn parse(filename: &str, app_name: &str, database: &str) -> Option<BackupArtifact> {
    let path = Path::new(filename);
    if path.extension()?.to_str()? != EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;

    let segments: Vec<&str> = stem.split('-').collect();
    if segments.len() < 3 {
        return None;
    }

    let belongs_to_database = segments[0] == database
        || (segments[0] == app_name && segments[1] == database);
    if !belongs_to_database {
        return None;
    }

    let date = parse_date(segments[segments.len() - 2])?;
    let time = parse_time(segments[segments.len() - 1])?;

    Some(BackupArtifact {
        timestamp: NaiveDateTime::new(date, time),
        filename: filename.to_string(),
    })
}

fn parse_date(segment: &str) -> Option<NaiveDate> {
    lazy_static! {
        static ref REGEX_DATE: Regex = Regex::new(r"^(\d{4})(\d{2})(\d{2})$").unwrap();
    }
    let caps = REGEX_DATE.captures(segment)?;

    NaiveDate::from_ymd_opt(
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    )
}

fn parse_time(segment: &str) -> Option<NaiveTime> {
    lazy_static! {
        static ref REGEX_TIME: Regex = Regex::new(r"^(\d{2})(\d{2})(\d{2})$").unwrap();
    }
    let caps = REGEX_TIME.captures(segment)?;

    NaiveTime::from_hms_opt(
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    )
}
