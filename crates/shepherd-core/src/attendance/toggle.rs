use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::models::AttendanceStatus;

use super::cache::{AttendanceCache, MeetingRef};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AttendanceError {
    #[error("No cached attendance for person {person_id} in meeting {meeting_id}")]
    NotCached { meeting_id: i64, person_id: i64 },

    #[error("Attendance for person {person_id} in meeting {meeting_id} is already being updated")]
    ToggleInFlight { meeting_id: i64, person_id: i64 },
}

/// Cache shared between readers and in-flight toggles.
pub type SharedAttendanceCache = Arc<RwLock<AttendanceCache>>;

/// Flip a person's attendance optimistically.
///
/// The cache shows the new status before `send` is awaited; `send` receives
/// the status to persist. On failure the old status is restored and the
/// meeting's pages are marked stale. On success the meeting's counts are
/// marked stale. The lock is never held across `send`.
pub async fn toggle_attendance<F, Fut>(
    cache: &SharedAttendanceCache,
    meeting: MeetingRef,
    person_id: i64,
    send: F,
) -> Result<AttendanceStatus>
where
    F: FnOnce(AttendanceStatus) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let snapshot = cache.write().await.apply_toggle(meeting, person_id)?;
    debug!(
        meeting_id = meeting.meeting_id,
        person_id,
        status = %snapshot.new_status,
        pages = snapshot.pages_touched(),
        "Applied optimistic attendance toggle"
    );

    let outcome = send(snapshot.new_status).await;

    let mut guard = cache.write().await;
    guard.settle(&snapshot);
    match outcome {
        Ok(()) => {
            guard.invalidate_summary(meeting);
            Ok(snapshot.new_status)
        }
        Err(e) => {
            guard.rollback(&snapshot);
            guard.invalidate_meeting(meeting);
            warn!(
                meeting_id = meeting.meeting_id,
                person_id,
                error = %e,
                "Attendance update failed, rolled back"
            );
            Err(e).context("Failed to update attendance")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::cache::tests::{page, record};
    use crate::attendance::AttendanceQuery;
    use crate::models::AttendanceSummary;
    use AttendanceStatus::*;

    const MEETING: MeetingRef = MeetingRef {
        group_id: 4,
        meeting_id: 40,
    };

    fn shared() -> (SharedAttendanceCache, AttendanceQuery, AttendanceQuery) {
        let mut cache = AttendanceCache::default();
        let first = AttendanceQuery::new(MEETING, 0, 2);
        let second = AttendanceQuery::new(MEETING, 1, 2);
        cache.put_page(first.clone(), page(vec![record(1, Present), record(2, Absent)], 0));
        cache.put_page(second.clone(), page(vec![record(3, Present), record(2, Absent)], 1));
        cache.put_summary(MEETING, AttendanceSummary { present: 2, absent: 1 });
        (Arc::new(RwLock::new(cache)), first, second)
    }

    #[tokio::test]
    async fn test_failed_toggle_restores_pre_toggle_state() {
        let (cache, first, second) = shared();
        let before_first = cache.read().await.page(&first).cloned();
        let before_second = cache.read().await.page(&second).cloned();

        let observer = cache.clone();
        let result = toggle_attendance(&cache, MEETING, 2, |status| async move {
            assert_eq!(status, Present);
            // The optimistic value is visible while the request is pending
            assert_eq!(observer.read().await.status_of(MEETING, 2), Some(Present));
            Err::<(), _>(anyhow::anyhow!("connection reset"))
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to update attendance"));

        let guard = cache.read().await;
        assert_eq!(guard.page(&first).cloned(), before_first);
        assert_eq!(guard.page(&second).cloned(), before_second);
        assert!(guard.is_stale(&first));
        assert!(guard.is_stale(&second));
        assert!(guard.is_summary_fresh(MEETING));
        assert!(!guard.is_in_flight(MEETING, 2));
    }

    #[tokio::test]
    async fn test_successful_toggle_keeps_new_status_and_invalidates_counts() {
        let (cache, first, second) = shared();

        let status = toggle_attendance(&cache, MEETING, 1, |_| async { Ok::<(), anyhow::Error>(()) })
            .await
            .expect("toggle should succeed");
        assert_eq!(status, Absent);

        let guard = cache.read().await;
        assert_eq!(guard.status_of(MEETING, 1), Some(Absent));
        assert!(guard.is_fresh(&first));
        assert!(guard.is_fresh(&second));
        assert!(!guard.is_summary_fresh(MEETING));
        assert!(!guard.is_in_flight(MEETING, 1));
    }

    #[tokio::test]
    async fn test_uncached_person_sends_nothing() {
        let (cache, _, _) = shared();
        let err = toggle_attendance(&cache, MEETING, 99, |_| async {
            Err::<(), _>(anyhow::anyhow!("no request expected for an uncached person"))
        })
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AttendanceError>(),
            Some(AttendanceError::NotCached { person_id: 99, .. })
        ));
    }

    #[tokio::test]
    async fn test_double_toggle_while_pending_is_rejected() {
        let (cache, _, _) = shared();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let pending_cache = cache.clone();
        let pending = tokio::spawn(async move {
            toggle_attendance(&pending_cache, MEETING, 3, |_| async move {
                let _ = release_rx.await;
                Ok::<(), anyhow::Error>(())
            })
            .await
        });

        while !cache.read().await.is_in_flight(MEETING, 3) {
            tokio::task::yield_now().await;
        }

        let err = toggle_attendance(&cache, MEETING, 3, |_| async { Ok::<(), anyhow::Error>(()) })
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AttendanceError>(),
            Some(AttendanceError::ToggleInFlight { person_id: 3, .. })
        ));

        let _ = release_tx.send(());
        let status = pending
            .await
            .expect("task should join")
            .expect("first toggle should succeed");
        assert_eq!(status, Absent);
        assert_eq!(cache.read().await.status_of(MEETING, 3), Some(Absent));
    }
}
