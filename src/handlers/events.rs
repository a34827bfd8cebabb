use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, Sse};
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::authorize;
use crate::models::ActivityEvent;
use crate::state::AppState;

const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);
const CATCHUP_LIMIT: i64 = 500;

#[derive(Deserialize)]
pub struct EventsQuery {
    pub token: Option<String>,
    pub last_id: Option<i64>,
}

fn to_sse(event: &ActivityEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_default();
    Event::default()
        .id(event.id.to_string())
        .event("activity")
        .data(data)
}

// GET /api/admin/events
pub async fn activity_stream(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, AppError> {
    // EventSource cannot set headers, so the session token rides in the query.
    authorize(&state, query.token.as_deref().unwrap_or(""))?;

    // Subscribe before the catch-up read so nothing lands in between.
    let rx = state.activity_tx.subscribe();

    let last_id = query.last_id.unwrap_or(0);
    let catchup_events = {
        let db = state.db()?;
        queries::get_activity_events_since(&db, last_id, CATCHUP_LIMIT)?
    };
    let high_water = catchup_events.last().map(|e| e.id).unwrap_or(last_id);

    let catchup_stream =
        tokio_stream::iter(catchup_events).map(|event| Ok::<_, Infallible>(to_sse(&event)));

    let live_stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(event) if event.id > high_water => Some(Ok(to_sse(&event))),
        Ok(_) => None,
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "activity stream lagged");
            None
        }
    });

    let keepalive_stream = tokio_stream::wrappers::IntervalStream::new(tokio::time::interval(
        KEEPALIVE_INTERVAL,
    ))
    .map(|_| Ok(Event::default().comment("keepalive")));

    let combined = catchup_stream.chain(live_stream);
    Ok(Sse::new(StreamExt::merge(combined, keepalive_stream)))
}
