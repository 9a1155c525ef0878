//! Attendance reads and writes through the query cache.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::models::{AttendanceStatus, AttendanceSummary, Meeting, MeetingAttendance, Page};

use super::cache::{AttendanceCache, AttendanceQuery, MeetingRef};
use super::toggle::{toggle_attendance, SharedAttendanceCache};

/// Maximum concurrent API requests when fetching many meetings' counts.
const MAX_CONCURRENT_REQUESTS: usize = 8;

/// Upper bound on pages walked while looking for one person.
const MAX_LOOKUP_PAGES: u32 = 50;

#[derive(Clone)]
pub struct AttendanceService {
    client: ApiClient,
    cache: SharedAttendanceCache,
}

impl AttendanceService {
    pub fn new(client: ApiClient) -> Self {
        Self::with_cache(client, Arc::new(RwLock::new(AttendanceCache::default())))
    }

    pub fn with_cache(client: ApiClient, cache: SharedAttendanceCache) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> SharedAttendanceCache {
        self.cache.clone()
    }

    /// A page of attendance, from cache while fresh.
    pub async fn page(&self, query: &AttendanceQuery) -> Result<Page<MeetingAttendance>> {
        {
            let cache = self.cache.read().await;
            if cache.is_fresh(query) {
                if let Some(page) = cache.page(query) {
                    return Ok(page.clone());
                }
            }
        }
        self.fetch_page(query).await
    }

    async fn fetch_page(&self, query: &AttendanceQuery) -> Result<Page<MeetingAttendance>> {
        let page = self
            .client
            .fetch_attendance(query)
            .await
            .with_context(|| format!("Failed to fetch attendance for meeting {}", query.meeting.meeting_id))?;
        debug!(
            meeting_id = query.meeting.meeting_id,
            page = query.page,
            records = page.content.len(),
            "Fetched attendance page"
        );
        self.cache.write().await.put_page(query.clone(), page.clone());
        Ok(page)
    }

    /// Walk the meeting's pages until the person's record is cached.
    pub async fn ensure_cached(&self, meeting: MeetingRef, person_id: i64, page_size: u32) -> Result<bool> {
        if self.cache.read().await.status_of(meeting, person_id).is_some() {
            return Ok(true);
        }
        for number in 0..MAX_LOOKUP_PAGES {
            let page = self
                .page(&AttendanceQuery::new(meeting, number, page_size))
                .await?;
            if page.content.iter().any(|r| r.person.id == person_id) {
                return Ok(true);
            }
            if !page.has_next() {
                break;
            }
        }
        Ok(false)
    }

    /// Optimistically flip a person's status and persist it.
    pub async fn toggle(&self, meeting: MeetingRef, person_id: i64) -> Result<AttendanceStatus> {
        let client = self.client.clone();
        let status = toggle_attendance(&self.cache, meeting, person_id, |status| async move {
            client
                .set_attendance(meeting.group_id, meeting.meeting_id, person_id, status)
                .await
        })
        .await?;
        info!(
            meeting_id = meeting.meeting_id,
            person_id,
            status = %status,
            "Attendance updated"
        );
        Ok(status)
    }

    /// Meeting counts, from cache while fresh.
    pub async fn summary(&self, meeting: MeetingRef) -> Result<AttendanceSummary> {
        {
            let cache = self.cache.read().await;
            if cache.is_summary_fresh(meeting) {
                if let Some(summary) = cache.summary(meeting) {
                    return Ok(summary);
                }
            }
        }
        let summary = self
            .client
            .fetch_attendance_summary(meeting.group_id, meeting.meeting_id)
            .await
            .with_context(|| format!("Failed to fetch counts for meeting {}", meeting.meeting_id))?;
        self.cache.write().await.put_summary(meeting, summary);
        Ok(summary)
    }

    /// Counts for many meetings of a group, fetched concurrently.
    /// Meetings whose counts fail are logged and skipped.
    pub async fn summaries(&self, group_id: i64, meetings: &[Meeting]) -> Vec<(Meeting, AttendanceSummary)> {
        let results: Vec<(Meeting, Result<AttendanceSummary>)> = stream::iter(meetings.iter().cloned())
            .map(|meeting| async move {
                let summary = self.summary(MeetingRef::new(group_id, meeting.id)).await;
                (meeting, summary)
            })
            .buffer_unordered(MAX_CONCURRENT_REQUESTS)
            .collect()
            .await;

        let mut ok = Vec::with_capacity(results.len());
        for (meeting, result) in results {
            match result {
                Ok(summary) => ok.push((meeting, summary)),
                Err(e) => warn!(meeting_id = meeting.id, error = %e, "Skipping meeting counts"),
            }
        }
        ok.sort_by_key(|(m, _)| m.id);
        ok
    }

    /// Refetch every stale page. Returns how many were refreshed.
    pub async fn refresh_stale(&self) -> Result<usize> {
        let stale = self.cache.read().await.stale_queries();
        let fetches = stale.iter().map(|q| self.fetch_page(q));
        let results = futures::future::join_all(fetches).await;
        let mut refreshed = 0;
        for result in results {
            result?;
            refreshed += 1;
        }
        Ok(refreshed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::TestServer;
    use crate::attendance::cache::tests::{page, record};
    use reqwest::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_fresh_page_served_from_cache() {
        // The client points nowhere; a cache miss would fail.
        let client = ApiClient::new("http://127.0.0.1:9").expect("client");
        let service = AttendanceService::new(client);
        let query = AttendanceQuery::new(MeetingRef::new(1, 2), 0, 10);
        let cached = page(vec![record(5, AttendanceStatus::Present)], 0);
        service.cache().write().await.put_page(query.clone(), cached.clone());

        let served = service.page(&query).await.expect("served from cache");
        assert_eq!(served, cached);
        assert!(service
            .ensure_cached(MeetingRef::new(1, 2), 5, 10)
            .await
            .expect("already cached"));
    }

    #[tokio::test]
    async fn test_fresh_summary_served_from_cache() {
        let client = ApiClient::new("http://127.0.0.1:9").expect("client");
        let service = AttendanceService::new(client);
        let meeting = MeetingRef::new(1, 2);
        let counts = AttendanceSummary { present: 3, absent: 2 };
        service.cache().write().await.put_summary(meeting, counts);
        assert_eq!(service.summary(meeting).await.expect("cached"), counts);
    }

    #[tokio::test]
    async fn test_failed_toggle_over_network_rolls_back() {
        let client = ApiClient::new("http://127.0.0.1:9").expect("client");
        let service = AttendanceService::new(client);
        let meeting = MeetingRef::new(1, 2);
        let query = AttendanceQuery::new(meeting, 0, 10);
        let cached = page(vec![record(5, AttendanceStatus::Absent)], 0);
        service.cache().write().await.put_page(query.clone(), cached.clone());

        assert!(service.toggle(meeting, 5).await.is_err());
        let cache = service.cache();
        let guard = cache.read().await;
        assert_eq!(guard.page(&query), Some(&cached));
        assert!(guard.is_stale(&query));
    }

    #[tokio::test]
    async fn test_successful_toggle_keeps_new_status_and_refetches_counts() {
        let server = TestServer::start().await;
        server
            .empty(Method::PUT, "/groups/1/meetings/2/attendance", StatusCode::NO_CONTENT)
            .json(
                Method::GET,
                "/groups/1/meetings/2/attendance/summary",
                StatusCode::OK,
                json!({"present": 4, "absent": 1}),
            );
        let service = AttendanceService::new(server.client());
        let meeting = MeetingRef::new(1, 2);
        let query = AttendanceQuery::new(meeting, 0, 10);
        service
            .cache()
            .write()
            .await
            .put_page(query.clone(), page(vec![record(5, AttendanceStatus::Absent)], 0));
        service
            .cache()
            .write()
            .await
            .put_summary(meeting, AttendanceSummary { present: 3, absent: 2 });

        let status = service.toggle(meeting, 5).await.expect("toggle");
        assert_eq!(status, AttendanceStatus::Present);
        {
            let cache = service.cache();
            let guard = cache.read().await;
            assert_eq!(guard.status_of(meeting, 5), Some(AttendanceStatus::Present));
            assert!(guard.is_fresh(&query));
            assert!(!guard.is_summary_fresh(meeting));
            assert!(!guard.is_in_flight(meeting, 5));
        }

        let counts = service.summary(meeting).await.expect("refetched counts");
        assert_eq!(counts, AttendanceSummary { present: 4, absent: 1 });

        let requests = server.requests();
        assert_eq!(requests[0].method, Method::PUT);
        assert_eq!(requests[0].body, Some(json!({"personId": 5, "status": "PRESENT"})));
        assert_eq!(requests[1].path, "/groups/1/meetings/2/attendance/summary");
    }

    #[tokio::test]
    async fn test_ensure_cached_walks_pages() {
        let server = TestServer::start().await;
        server.json(
            Method::GET,
            "/groups/1/meetings/2/attendance",
            StatusCode::OK,
            json!({
                "content": [{"people": {"id": 8, "firstName": "Davi", "lastName": "Costa"}, "status": "ABSENT"}],
                "totalElements": 1,
                "totalPages": 1,
                "number": 0,
                "size": 10
            }),
        );
        let service = AttendanceService::new(server.client());
        let meeting = MeetingRef::new(1, 2);

        assert!(service.ensure_cached(meeting, 8, 10).await.expect("lookup"));
        assert!(!service.ensure_cached(meeting, 9, 10).await.expect("lookup"));
        assert_eq!(
            service.cache().read().await.status_of(meeting, 8),
            Some(AttendanceStatus::Absent)
        );
    }
}
