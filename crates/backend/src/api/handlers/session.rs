use axum::extract::State;
use axum::Json;
use contracts::shared::action_result::ActionResult;
use contracts::shared::session_state::{OrderFilters, SessionState};
use contracts::system::tasks::TaskKind;

use crate::shared::error::{ok, AppResult};
use crate::system::auth::CurrentUser;
use crate::AppState;

/// GET /api/session/state
///
/// A stale sync flag is cleared once no bulk run is active.
pub async fn get_state(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> AppResult<Json<ActionResult<SessionState>>> {
    let mut current = state.sessions.get(&claims.sub).await;
    if current.sync_in_progress && !state.tasks.is_running(TaskKind::ErpSyncAll) {
        current = state
            .sessions
            .update(&claims.sub, Box::new(|s| s.sync_in_progress = false))
            .await;
    }
    Ok(ok(current))
}

/// PUT /api/session/filters
pub async fn set_filters(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(filters): Json<OrderFilters>,
) -> AppResult<Json<ActionResult<SessionState>>> {
    let updated = state
        .sessions
        .update(&claims.sub, Box::new(move |s| s.filters = filters))
        .await;
    Ok(ok(updated))
}
