use axum::extract::State;
use axum::Json;
use chrono::Utc;
use contracts::dashboards::d400_order_stats::dto::{DiagnosticsReport, OrderStats};
use contracts::shared::action_result::ActionResult;

use crate::dashboards::d400_order_stats::service;
use crate::shared::error::{ok, AppResult};
use crate::system::auth::CurrentUser;
use crate::AppState;

/// GET /api/d400/stats
///
/// Also cached in the caller's session state.
pub async fn get_stats(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> AppResult<Json<ActionResult<OrderStats>>> {
    let stats = service::primary_stats(&state.db, Utc::now().date_naive()).await?;
    let cached = stats.clone();
    state
        .sessions
        .update(&claims.sub, Box::new(move |s| s.cached_stats = Some(cached)))
        .await;
    Ok(ok(stats))
}

/// GET /api/diagnostics
pub async fn diagnostics(
    State(state): State<AppState>,
) -> AppResult<Json<ActionResult<DiagnosticsReport>>> {
    Ok(ok(service::diagnostics(&state.db, Utc::now().date_naive()).await?))
}
