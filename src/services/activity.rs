use crate::db::queries;
use crate::models::ActivityKind;
use crate::state::AppState;

/// Persists an activity event and broadcasts it to dashboard subscribers.
/// Failures are logged; the mutation that triggered the event has already
/// been committed.
pub fn record(
    state: &AppState,
    kind: ActivityKind,
    subject_id: &str,
    reference: Option<&str>,
    detail: Option<&str>,
) {
    let event = state.db().map_err(anyhow::Error::from).and_then(|db| {
        queries::insert_activity_event(&db, kind, subject_id, reference, detail)
    });

    match event {
        Ok(event) => {
            // No subscribers is fine
            let _ = state.activity_tx.send(event);
        }
        Err(e) => {
            tracing::error!(error = %e, kind = kind.as_str(), "failed to record activity event");
        }
    }
}
