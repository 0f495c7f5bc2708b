use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(StudentId);

/// Wire format for attendance dates.
pub const ATTENDANCE_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Late,
        AttendanceStatus::Excused,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Late => "Late",
            AttendanceStatus::Excused => "Excused",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown attendance status '{0}' (expected Present, Absent, Late or Excused)")]
pub struct UnknownAttendanceStatus(pub String);

impl FromStr for AttendanceStatus {
    type Err = UnknownAttendanceStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownAttendanceStatus(raw.to_string()))
    }
}

/// Status of a stored attendance entry. Known names are matched
/// case-insensitively; anything else is kept verbatim so records written by
/// other clients still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordedStatus {
    Known(AttendanceStatus),
    Other(String),
}

impl RecordedStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RecordedStatus::Known(status) => status.as_str(),
            RecordedStatus::Other(raw) => raw,
        }
    }

    pub fn known(&self) -> Option<AttendanceStatus> {
        match self {
            RecordedStatus::Known(status) => Some(*status),
            RecordedStatus::Other(_) => None,
        }
    }
}

impl From<AttendanceStatus> for RecordedStatus {
    fn from(status: AttendanceStatus) -> Self {
        RecordedStatus::Known(status)
    }
}

impl From<String> for RecordedStatus {
    fn from(raw: String) -> Self {
        match raw.parse() {
            Ok(status) => RecordedStatus::Known(status),
            Err(_) => RecordedStatus::Other(raw),
        }
    }
}

impl From<RecordedStatus> for String {
    fn from(status: RecordedStatus) -> Self {
        match status {
            RecordedStatus::Known(status) => status.as_str().to_string(),
            RecordedStatus::Other(raw) => raw,
        }
    }
}

impl PartialEq<AttendanceStatus> for RecordedStatus {
    fn eq(&self, other: &AttendanceStatus) -> bool {
        self.known() == Some(*other)
    }
}

impl fmt::Display for RecordedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub date: String,
    pub status: RecordedStatus,
}

impl AttendanceRecord {
    pub fn new(date: impl Into<String>, status: impl Into<RecordedStatus>) -> Self {
        Self {
            date: date.into(),
            status: status.into(),
        }
    }

    /// Parses `date` as a `YYYY-MM-DD` calendar date. The record service does
    /// not enforce the format, so this may be `None` for hand-entered values.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        parse_attendance_date(&self.date)
    }
}

pub fn parse_attendance_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), ATTENDANCE_DATE_FORMAT).ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub email: String,
    /// Insertion order is entry order. Absent or `null` on the wire decodes as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attendance: Vec<AttendanceRecord>,
}

impl Student {
    pub fn attendance_count(&self) -> usize {
        self.attendance.len()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<AttendanceRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<AttendanceRecord>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
