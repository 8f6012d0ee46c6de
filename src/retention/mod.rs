use std::{collections::HashSet, str::FromStr, time::Duration};

use chrono::NaiveDate;

use crate::artifact::BackupArtifact;
use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KeepPeriod {
    Week,
    Month,
    Year,
}

impl KeepPeriod {
    fn bucket_pattern(&self) -> &'static str {
        match self {
            KeepPeriod::Week => "%G%V",
            KeepPeriod::Month => "%Y%m",
            KeepPeriod::Year => "%Y",
        }
    }

    pub fn bucket_key(&self, date: NaiveDate) -> String {
        date.format(self.bucket_pattern()).to_string()
    }
}

impl FromStr for KeepPeriod {
    type Err = Error;

    fn from_str(value: &str) -> Result<KeepPeriod, Error> {
        match value.trim() {
            "week" => Ok(KeepPeriod::Week),
            "month" => Ok(KeepPeriod::Month),
            "year" => Ok(KeepPeriod::Year),
            other => Err(Error::InvalidPolicy(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Reason {
    WithinGraceWindow,
    FirstOfBucket(String),
    BucketAlreadyKept(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct RetentionDecision {
    pub artifact: BackupArtifact,
    pub reason: Reason,
}

impl RetentionDecision {
    pub fn is_delete(&self) -> bool {
        matches!(self.reason, Reason::BucketAlreadyKept(_))
    }
}

pub struct RetentionPolicy {
    keep_all_backup_last: Duration,
    keep_one_backup_each: KeepPeriod,
}

impl RetentionPolicy {
    pub fn new(keep_all_backup_last: Duration, keep_one_backup_each: KeepPeriod) -> RetentionPolicy {
        RetentionPolicy {
            keep_all_backup_last,
            keep_one_backup_each,
        }
    }

    /// Everything dated after this day is inside the grace window.
    pub fn grace_boundary(&self, today: NaiveDate) -> NaiveDate {
        chrono::Duration::from_std(self.keep_all_backup_last)
            .ok()
            .and_then(|grace| today.checked_sub_signed(grace))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Classifies `backups` in the given order, which must be oldest first
    /// for the earliest backup of each bucket to survive.
    ///
    /// Backups inside the grace window are always kept and don't claim their
    /// bucket.
    pub fn evaluate(&self, backups: &[BackupArtifact], today: NaiveDate) -> Vec<RetentionDecision> {
        let boundary = self.grace_boundary(today);
        let mut already_kept: HashSet<String> = HashSet::new();

        backups
            .iter()
            .map(|backup| {
                let date = backup.timestamp.date();
                let reason = if date > boundary {
                    Reason::WithinGraceWindow
                } else {
                    let bucket = self.keep_one_backup_each.bucket_key(date);
                    if already_kept.contains(&bucket) {
                        Reason::BucketAlreadyKept(bucket)
                    } else {
                        already_kept.insert(bucket.clone());
                        Reason::FirstOfBucket(bucket)
                    }
                };

                RetentionDecision {
                    artifact: backup.clone(),
                    reason,
                }
            })
            .collect()
    }
}
