//! SSE streaming endpoint.
//!
//! GET /api/jobs/{job_id}/events
//!
//! Replays the job's progress so far, then forwards live events. Each SSE
//! event is named after the event's `type` and carries the JSON record. The
//! stream ends after the `finished` event.

use std::convert::Infallible;

use axum::{
    extract::{Extension, Path},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::StreamExt;
use uuid::Uuid;

use crate::kernel::jobs::JobEvent;
use crate::server::app::AppState;
use crate::server::error::ApiError;

/// SSE stream handler.
///
/// Unknown jobs are rejected before the stream opens. Dropping the response
/// (client disconnect) drops the subscription, which detaches it from the job.
pub async fn stream_handler(
    Extension(state): Extension<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Sse<impl futures::Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let subscription = state.jobs.subscribe(job_id)?;
    tracing::debug!(%job_id, subscriber_id = %subscription.id(), "SSE stream opened");

    let events = subscription.filter_map(|event| async move { to_sse(&event).map(Ok::<_, Infallible>) });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn to_sse(event: &JobEvent) -> Option<Event> {
    match Event::default().event(event.name()).json_data(event) {
        Ok(sse) => Some(sse),
        Err(e) => {
            tracing::warn!(job_id = %event.job_id(), error = %e, "Failed to encode event");
            None
        }
    }
}
