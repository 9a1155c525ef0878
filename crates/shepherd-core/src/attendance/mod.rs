//! Attendance tracking with optimistic updates.
//!
//! Attendance pages are cached per query. Toggling a person flips their
//! status in every cached page of the meeting before the request resolves;
//! a failed request puts the old status back and marks the meeting's pages
//! stale so the next read resyncs with the server. A successful one marks the
//! meeting's counts stale.

pub mod cache;
pub mod metrics;
pub mod service;
pub mod toggle;

pub use cache::{AttendanceCache, AttendanceQuery, MeetingRef, ToggleSnapshot};
pub use metrics::AttendanceMetrics;
pub use service::AttendanceService;
pub use toggle::{toggle_attendance, AttendanceError, SharedAttendanceCache};
