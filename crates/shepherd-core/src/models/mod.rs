//! Data models for church-management entities.
//!
//! - `Person`: a registered member
//! - `Page`: the paginated envelope every list endpoint returns
//! - `RoleStrategyNode`, `Strategy`: role hierarchies for home groups
//! - `MeetingAttendance`, `AttendanceStatus`, `AttendanceSummary`: attendance records
//! - `HomeGroup`, `Meeting`: home groups and their meetings
//! - `Church`, `Worship`, `ChurchEvent`: organization-level records

pub mod attendance;
pub mod church;
pub mod group;
pub mod page;
pub mod person;
pub mod role;

pub use attendance::{AttendanceStatus, AttendanceSummary, MeetingAttendance};
pub use church::{Church, ChurchEvent, Worship};
pub use group::{HomeGroup, Meeting};
pub use page::Page;
pub use person::Person;
pub use role::{RoleStrategyNode, Strategy};
