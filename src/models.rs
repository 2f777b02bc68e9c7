// Data models for the task tracker

use crate::error::TaskError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A tracked unit of work.
///
/// Field order here is the field order written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub description: String,
    pub status: Status,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// New `todo` task with both timestamps set to `at`
    pub fn new(id: impl Into<String>, description: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            status: Status::Todo,
            created_at: at,
            updated_at: at,
        }
    }

    /// Numeric value of the id, if it is one
    pub fn numeric_id(&self) -> Option<u64> {
        self.id.trim().parse().ok()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Todo, Status::InProgress, Status::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "in-progress",
            Status::Done => "done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = TaskError;

    /// Exact, case-sensitive match against the stored values
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| TaskError::validation(format!("Unknown status: {}", s)))
    }
}

/// Current time, truncated to the precision that is persisted
pub fn now() -> DateTime<Utc> {
    timestamp::truncate(Utc::now())
}

/// ISO-8601 UTC timestamps with microsecond precision.
///
/// Reads RFC 3339 strings with any offset, and offset-less strings which
/// are taken to be UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.format(FORMAT).to_string()
    }

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn truncate(ts: DateTime<Utc>) -> DateTime<Utc> {
        ts.trunc_subsecs(6)
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", s)))
    }
}
