use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use contracts::shared::action_result::ActionResult;
use contracts::shared::events::AppEvent;
use contracts::system::tasks::TaskRunInfo;
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::shared::error::{ok, AppError, AppResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct EventsParams {
    pub token: String,
}

/// GET /api/tasks/:run_id
pub async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> AppResult<Json<ActionResult<TaskRunInfo>>> {
    state
        .tasks
        .get_run(&run_id)
        .map(ok)
        .ok_or_else(|| AppError::NotFound(format!("Run {} not found", run_id)))
}

/// GET /api/tasks/:run_id/events?token=
///
/// Server-sent events of one run. The first event is the run's current
/// record, so a subscriber that connects late still sees a finished run.
pub async fn events(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    Query(params): Query<EventsParams>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    if !state.tasks.authorize(&run_id, &params.token) {
        return Err(AppError::Auth("Invalid run token".into()));
    }
    let info = state
        .tasks
        .get_run(&run_id)
        .ok_or_else(|| AppError::NotFound(format!("Run {} not found", run_id)))?;

    let receiver = state.tasks.subscribe();
    let initial = tokio_stream::once(Event::default().event("run").json_data(&info));
    let updates = BroadcastStream::new(receiver).filter_map(move |message| match message {
        Ok(event) if event.run_id() == Some(run_id.as_str()) => Some(to_sse(&event)),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("Event stream lagged: {}", e);
            None
        }
    });

    Ok(Sse::new(initial.chain(updates)).keep_alive(KeepAlive::default()))
}

fn to_sse(event: &AppEvent) -> Result<Event, axum::Error> {
    Event::default().event(event.name()).json_data(event)
}
