use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{AttendanceStatus, AttendanceSummary, MeetingAttendance, Page};

use super::toggle::AttendanceError;

/// How long a fetched query is served without going back to the server.
const QUERY_FRESH_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeetingRef {
    pub group_id: i64,
    pub meeting_id: i64,
}

impl MeetingRef {
    pub fn new(group_id: i64, meeting_id: i64) -> Self {
        Self {
            group_id,
            meeting_id,
        }
    }
}

/// One cached attendance listing: a page of a meeting, optionally filtered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttendanceQuery {
    pub meeting: MeetingRef,
    pub page: u32,
    pub size: u32,
    pub search: Option<String>,
}

impl AttendanceQuery {
    pub fn new(meeting: MeetingRef, page: u32, size: u32) -> Self {
        Self {
            meeting,
            page,
            size,
            search: None,
        }
    }

    /// Blank searches are the same query as no search.
    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);
        self
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    data: T,
    fetched_at: DateTime<Utc>,
    stale: bool,
}

impl<T> Entry<T> {
    fn new(data: T) -> Self {
        Self {
            data,
            fetched_at: Utc::now(),
            stale: false,
        }
    }

    fn is_fresh(&self, max_age: Duration) -> bool {
        !self.stale && Utc::now() - self.fetched_at <= max_age
    }
}

/// What an optimistic toggle changed, so it can be undone.
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleSnapshot {
    pub meeting: MeetingRef,
    pub person_id: i64,
    pub new_status: AttendanceStatus,
    previous: Vec<(AttendanceQuery, AttendanceStatus)>,
}

impl ToggleSnapshot {
    pub fn previous_status(&self) -> AttendanceStatus {
        self.new_status.toggled()
    }

    /// Number of cached pages the toggle touched
    pub fn pages_touched(&self) -> usize {
        self.previous.len()
    }
}

/// In-memory query cache for attendance pages and meeting counts.
#[derive(Debug)]
pub struct AttendanceCache {
    pages: HashMap<AttendanceQuery, Entry<Page<MeetingAttendance>>>,
    summaries: HashMap<MeetingRef, Entry<AttendanceSummary>>,
    in_flight: HashSet<(MeetingRef, i64)>,
    max_age: Duration,
}

impl Default for AttendanceCache {
    fn default() -> Self {
        Self::new(Duration::seconds(QUERY_FRESH_SECS))
    }
}

impl AttendanceCache {
    pub fn new(max_age: Duration) -> Self {
        Self {
            pages: HashMap::new(),
            summaries: HashMap::new(),
            in_flight: HashSet::new(),
            max_age,
        }
    }

    // ===== Pages =====

    pub fn put_page(&mut self, query: AttendanceQuery, page: Page<MeetingAttendance>) {
        self.pages.insert(query, Entry::new(page));
    }

    pub fn page(&self, query: &AttendanceQuery) -> Option<&Page<MeetingAttendance>> {
        self.pages.get(query).map(|e| &e.data)
    }

    pub fn is_fresh(&self, query: &AttendanceQuery) -> bool {
        self.pages
            .get(query)
            .is_some_and(|e| e.is_fresh(self.max_age))
    }

    pub fn is_stale(&self, query: &AttendanceQuery) -> bool {
        self.pages.get(query).is_some_and(|e| e.stale)
    }

    /// Cached status of a person in a meeting. When pages disagree, a page
    /// that is not stale wins, then the most recently fetched one.
    pub fn status_of(&self, meeting: MeetingRef, person_id: i64) -> Option<AttendanceStatus> {
        self.pages
            .iter()
            .filter(|(q, _)| q.meeting == meeting)
            .filter_map(|(_, e)| {
                e.data
                    .content
                    .iter()
                    .find(|r| r.person.id == person_id)
                    .map(|r| (!e.stale, e.fetched_at, r.status))
            })
            .max_by_key(|&(fresh, fetched_at, _)| (fresh, fetched_at))
            .map(|(_, _, status)| status)
    }

    /// Mark every cached page of a meeting stale.
    pub fn invalidate_meeting(&mut self, meeting: MeetingRef) {
        for (query, entry) in self.pages.iter_mut() {
            if query.meeting == meeting {
                entry.stale = true;
            }
        }
    }

    /// Stale page queries, for a refetch pass.
    pub fn stale_queries(&self) -> Vec<AttendanceQuery> {
        self.pages
            .iter()
            .filter(|(_, e)| e.stale)
            .map(|(q, _)| q.clone())
            .collect()
    }

    // ===== Summaries =====

    pub fn put_summary(&mut self, meeting: MeetingRef, summary: AttendanceSummary) {
        self.summaries.insert(meeting, Entry::new(summary));
    }

    pub fn summary(&self, meeting: MeetingRef) -> Option<AttendanceSummary> {
        self.summaries.get(&meeting).map(|e| e.data)
    }

    pub fn is_summary_fresh(&self, meeting: MeetingRef) -> bool {
        self.summaries
            .get(&meeting)
            .is_some_and(|e| e.is_fresh(self.max_age))
    }

    pub fn invalidate_summary(&mut self, meeting: MeetingRef) {
        if let Some(entry) = self.summaries.get_mut(&meeting) {
            entry.stale = true;
        }
    }

    // ===== Optimistic toggling =====

    pub fn is_in_flight(&self, meeting: MeetingRef, person_id: i64) -> bool {
        self.in_flight.contains(&(meeting, person_id))
    }

    /// Flip a person's status in every cached page of the meeting and mark the
    /// toggle in flight. All pages end on the same new status.
    pub fn apply_toggle(&mut self, meeting: MeetingRef, person_id: i64) -> Result<ToggleSnapshot, AttendanceError> {
        if self.is_in_flight(meeting, person_id) {
            return Err(AttendanceError::ToggleInFlight {
                meeting_id: meeting.meeting_id,
                person_id,
            });
        }
        let current = self
            .status_of(meeting, person_id)
            .ok_or(AttendanceError::NotCached {
                meeting_id: meeting.meeting_id,
                person_id,
            })?;
        let new_status = current.toggled();

        let mut previous = Vec::new();
        for (query, entry) in self.pages.iter_mut() {
            if query.meeting != meeting {
                continue;
            }
            for record in entry.data.content.iter_mut() {
                if record.person.id == person_id {
                    previous.push((query.clone(), record.status));
                    record.status = new_status;
                }
            }
        }

        self.in_flight.insert((meeting, person_id));
        Ok(ToggleSnapshot {
            meeting,
            person_id,
            new_status,
            previous,
        })
    }

    /// Put back the statuses a toggle replaced. Other people's records in the
    /// same pages are left as they are now.
    pub fn rollback(&mut self, snapshot: &ToggleSnapshot) {
        for (query, status) in &snapshot.previous {
            if let Some(entry) = self.pages.get_mut(query) {
                for record in entry.data.content.iter_mut() {
                    if record.person.id == snapshot.person_id {
                        record.status = *status;
                    }
                }
            }
        }
    }

    /// Release the in-flight mark of a settled toggle.
    pub fn settle(&mut self, snapshot: &ToggleSnapshot) {
        self.in_flight.remove(&(snapshot.meeting, snapshot.person_id));
    }
}
