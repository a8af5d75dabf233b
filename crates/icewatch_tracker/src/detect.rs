// --- File: crates/icewatch_tracker/src/detect.rs ---
//! Change detection: a session's snapshot trail only grows when something
//! worth knowing changed.

use chrono::{DateTime, Utc};
use icewatch_common::{EventRecord, Snapshot};
use icewatch_db::{DbError, SessionHandle, StoreTx};
use tracing::{debug, info};

/// What recording an observation did to a session's trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// First snapshot of the session.
    Created,
    /// A snapshot differing from the previous one was appended.
    Updated,
    /// Same state as the latest snapshot; nothing written.
    Unchanged,
}

impl Action {
    /// Whether the calendar needs to hear about it.
    pub fn changed(self) -> bool {
        !matches!(self, Action::Unchanged)
    }
}

/// Records `incoming` as seen at `observed_at`. A record that is listed is
/// by definition not cancelled.
pub async fn reconcile_session(
    tx: &mut StoreTx,
    session: &SessionHandle,
    incoming: EventRecord,
    observed_at: DateTime<Utc>,
) -> Result<(Action, Snapshot), DbError> {
    let candidate = Snapshot::observed(incoming, observed_at);
    let action = record_snapshot(tx, session, &candidate).await?;
    Ok((action, candidate))
}

/// Appends `candidate` unless it matches the session's latest snapshot.
pub async fn record_snapshot(
    tx: &mut StoreTx,
    session: &SessionHandle,
    candidate: &Snapshot,
) -> Result<Action, DbError> {
    let action = match tx.latest_snapshot(session).await? {
        None => Action::Created,
        Some(latest) if latest.same_state_as(candidate) => return Ok(Action::Unchanged),
        Some(_) => Action::Updated,
    };

    let seq = tx.append_snapshot(session, candidate).await?;
    match action {
        Action::Created => info!(
            "Creating event info: {} {} ({})",
            session.date(),
            session.session_id(),
            candidate.record.product_name
        ),
        _ => info!(
            "Updating event info: {} {} #{} (cancelled: {})",
            session.date(),
            session.session_id(),
            seq,
            candidate.cancelled
        ),
    }
    debug!("Snapshot {:?}", candidate);
    Ok(action)
}
