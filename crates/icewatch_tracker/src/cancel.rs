// --- File: crates/icewatch_tracker/src/cancel.rs ---
//! Cancellation inference. The booking site drops cancelled sessions from
//! its listing instead of flagging them, so a known future session missing
//! from a complete pass is taken to be cancelled.

use chrono::{DateTime, Utc};
use icewatch_common::{LocalZone, Snapshot};
use icewatch_db::{DbError, EventsHandle, SessionHandle, StoreTx};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::detect::{record_snapshot, Action};

/// Result of one day's cancellation sweep.
#[derive(Debug, Default)]
pub struct CancellationSweep {
    /// Sessions flagged by this sweep, with the snapshot that flagged them.
    pub cancelled: Vec<(SessionHandle, Snapshot)>,
    pub skipped_unparseable: usize,
}

/// Flags sessions of `events` that are absent from `observed` and have not
/// started by `now`.
///
/// Sessions are visited in key order and the sweep stops at the first one
/// that has already started.
pub async fn infer_cancellations(
    tx: &mut StoreTx,
    events: &EventsHandle,
    observed: &HashSet<String>,
    now: DateTime<Utc>,
    zone: &LocalZone,
) -> Result<CancellationSweep, DbError> {
    let mut sweep = CancellationSweep::default();

    for session in tx.sessions(events).await? {
        let Some(latest) = tx.latest_snapshot(&session).await? else {
            continue;
        };

        let start = match zone.parse_local(events.date(), &latest.record.start_time) {
            Ok(start) => start.with_timezone(&Utc),
            Err(e) => {
                warn!("Skipping session {}: {}", session.session_id(), e);
                sweep.skipped_unparseable += 1;
                continue;
            }
        };
        if start <= now {
            debug!(
                "Session {} on {} already started, ending cancellation sweep",
                session.session_id(),
                events.date()
            );
            break;
        }

        if observed.contains(session.session_id()) {
            continue;
        }

        let candidate = latest.cancelled_at(now);
        if record_snapshot(tx, &session, &candidate).await? == Action::Updated {
            info!("Session {} on {} cancelled", session.session_id(), events.date());
            sweep.cancelled.push((session, candidate));
        }
    }
    Ok(sweep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::reconcile_session;
    use chrono::TimeZone;
    use icewatch_common::EventRecord;
    use icewatch_db::DbClient;

    fn record(id: &str, start: &str) -> EventRecord {
        EventRecord {
            session_id: id.to_string(),
            product_name: "Public Skate".to_string(),
            location: "Pad 1".to_string(),
            start_time: start.to_string(),
            end_time: "23:00:00".to_string(),
            total_spaces: 50,
            available_spaces: 5,
            academy_capacity: 10,
            academy_available: 10,
        }
    }

    async fn seeded(db: &DbClient, sessions: &[(&str, &str)]) -> (StoreTx, EventsHandle) {
        let mut tx = db.begin_write().await.unwrap();
        let (day, _) = tx.ensure_day("2024-03-01").await.unwrap();
        let events = tx.get_or_create_events_scope(&day).await.unwrap();
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap();
        for (id, start) in sessions {
            let session = tx.get_or_create_session(&events, id).await.unwrap();
            reconcile_session(&mut tx, &session, record(id, start), t0).await.unwrap();
        }
        (tx, events)
    }

    fn observed(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn missing_future_session_is_cancelled_once() {
        let db = DbClient::in_memory().await.unwrap();
        let (mut tx, events) = seeded(&db, &[("A", "18:00:00"), ("B", "19:00:00")]).await;
        let zone = LocalZone::utc();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        let sweep = infer_cancellations(&mut tx, &events, &observed(&["A"]), now, &zone)
            .await
            .unwrap();
        assert_eq!(sweep.cancelled.len(), 1);
        assert_eq!(sweep.cancelled[0].0.session_id(), "B");
        assert!(sweep.cancelled[0].1.cancelled);
        assert_eq!(sweep.cancelled[0].1.observed_at, now);

        let again = infer_cancellations(&mut tx, &events, &observed(&["A"]), now, &zone)
            .await
            .unwrap();
        assert!(again.cancelled.is_empty());
        let b = tx.get_or_create_session(&events, "B").await.unwrap();
        assert_eq!(tx.snapshots(&b).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn sweep_stops_at_a_started_session() {
        let db = DbClient::in_memory().await.unwrap();
        // "A" has started; "B" sorts after it and is never examined
        let (mut tx, events) = seeded(&db, &[("A", "09:00:00"), ("B", "18:00:00")]).await;
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        let sweep = infer_cancellations(&mut tx, &events, &observed(&[]), now, &LocalZone::utc())
            .await
            .unwrap();
        assert!(sweep.cancelled.is_empty());
    }

    #[tokio::test]
    async fn session_starting_exactly_now_is_not_cancelled() {
        let db = DbClient::in_memory().await.unwrap();
        let (mut tx, events) = seeded(&db, &[("A", "12:00:00")]).await;
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        let sweep = infer_cancellations(&mut tx, &events, &observed(&[]), now, &LocalZone::utc())
            .await
            .unwrap();
        assert!(sweep.cancelled.is_empty());
    }

    #[tokio::test]
    async fn unparseable_start_is_skipped_and_counted() {
        let db = DbClient::in_memory().await.unwrap();
        let (mut tx, events) = seeded(&db, &[("A", "noon"), ("B", "18:00:00")]).await;
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        let sweep = infer_cancellations(&mut tx, &events, &observed(&[]), now, &LocalZone::utc())
            .await
            .unwrap();
        assert_eq!(sweep.skipped_unparseable, 1);
        assert_eq!(sweep.cancelled.len(), 1);
        assert_eq!(sweep.cancelled[0].0.session_id(), "B");
    }

    #[tokio::test]
    async fn sessions_without_snapshots_are_ignored() {
        let db = DbClient::in_memory().await.unwrap();
        let (mut tx, events) = seeded(&db, &[("B", "18:00:00")]).await;
        tx.get_or_create_session(&events, "A").await.unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        let sweep = infer_cancellations(&mut tx, &events, &observed(&["B"]), now, &LocalZone::utc())
            .await
            .unwrap();
        assert!(sweep.cancelled.is_empty());
        assert_eq!(sweep.skipped_unparseable, 0);
    }
}
