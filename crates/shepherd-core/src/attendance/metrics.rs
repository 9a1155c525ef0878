use serde::{Deserialize, Serialize};

use crate::models::AttendanceSummary;

/// Attendance aggregated over a set of meetings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceMetrics {
    pub meetings: usize,
    pub present: u64,
    pub absent: u64,
}

impl AttendanceMetrics {
    pub fn aggregate<'a>(summaries: impl IntoIterator<Item = &'a AttendanceSummary>) -> Self {
        summaries
            .into_iter()
            .fold(Self::default(), |acc, s| Self {
                meetings: acc.meetings + 1,
                present: acc.present + s.present,
                absent: acc.absent + s.absent,
            })
    }

    pub fn records(&self) -> u64 {
        self.present + self.absent
    }

    /// Present share of all records, 0-100. None when nothing was recorded.
    pub fn attendance_rate(&self) -> Option<f64> {
        match self.records() {
            0 => None,
            total => Some(self.present as f64 * 100.0 / total as f64),
        }
    }

    pub fn average_present(&self) -> Option<f64> {
        match self.meetings {
            0 => None,
            n => Some(self.present as f64 / n as f64),
        }
    }

    pub fn rate_display(&self) -> String {
        self.attendance_rate()
            .map(|r| format!("{:.1}%", r))
            .unwrap_or_else(|| "-".to_string())
    }
}
