use serde::{Deserialize, Serialize};

use super::Person;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn toggled(self) -> Self {
        match self {
            AttendanceStatus::Present => AttendanceStatus::Absent,
            AttendanceStatus::Absent => AttendanceStatus::Present,
        }
    }

    pub fn is_present(self) -> bool {
        self == AttendanceStatus::Present
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttendanceStatus::Present => write!(f, "Present"),
            AttendanceStatus::Absent => write!(f, "Absent"),
        }
    }
}

/// A person's attendance record for one meeting.
///
/// The API names the person field `people` even though it holds one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct MeetingAttendance {
    #[serde(rename = "people")]
    pub person: Person,
    pub status: AttendanceStatus,
}

/// Server-side attendance counts for one meeting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AttendanceSummary {
    #[serde(default)]
    pub present: u64,
    #[serde(default)]
    pub absent: u64,
}

impl AttendanceSummary {
    pub fn total(&self) -> u64 {
        self.present + self.absent
    }
}

/// Body of the mark-attendance request.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AttendanceUpdate {
    pub person_id: i64,
    pub status: AttendanceStatus,
}
