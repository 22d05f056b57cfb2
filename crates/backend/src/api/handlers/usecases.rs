use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use contracts::shared::action_result::ActionResult;
use contracts::shared::events::AppEvent;
use contracts::system::tasks::{TaskKind, TaskRun};
use contracts::usecases::u501_sync_from_erp::{SyncAllRequest, SyncOneResult, SyncProgress};
use contracts::usecases::u502_spreadsheet_sync::SpreadsheetImportResult;
use std::time::Duration;

use crate::shared::error::{ok, AppError, AppResult};
use crate::system::auth::CurrentUser;
use crate::usecases::u501_sync_from_erp::SyncOptions;
use crate::usecases::u502_spreadsheet_sync;
use crate::AppState;

// ============================================================================
// UseCase u501: Sync from ERP
// ============================================================================

/// POST /api/u501/sync/:external_id
pub async fn u501_sync_one(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> AppResult<Json<ActionResult<SyncOneResult>>> {
    Ok(ok(state.sync.sync_one(&external_id, true).await?))
}

/// POST /api/u501/sync-all
///
/// Starts the bulk run in the background; progress under the returned run id.
pub async fn u501_sync_all(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    request: Option<Json<SyncAllRequest>>,
) -> AppResult<Json<ActionResult<TaskRun>>> {
    let defaults = state.tasks.default_sync_options();
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let options = SyncOptions {
        page_size: request.page_size.filter(|s| *s > 0).unwrap_or(defaults.page_size),
        page_delay: request
            .page_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.page_delay),
    };

    let run = state
        .tasks
        .try_trigger_with(TaskKind::ErpSyncAll, options)
        .ok_or_else(|| AppError::Validation("An ERP sync is already running".into()))?;
    state
        .sessions
        .update(&claims.sub, Box::new(|s| s.sync_in_progress = true))
        .await;
    Ok(ok(run))
}

/// GET /api/u501/sync/:session_id/progress
pub async fn u501_get_progress(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<ActionResult<SyncProgress>>> {
    state
        .sync
        .get_progress(&session_id)
        .map(ok)
        .ok_or_else(|| AppError::NotFound(format!("Sync session {} not found", session_id)))
}

// ============================================================================
// UseCase u502: Spreadsheet sync
// ============================================================================

/// POST /api/u502/import (CSV body)
pub async fn u502_import(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    body: Bytes,
) -> AppResult<Json<ActionResult<SpreadsheetImportResult>>> {
    let result = u502_spreadsheet_sync::import_csv(&state.db, &body, &claims.username).await?;
    if result.created + result.updated > 0 {
        state.events.publish(AppEvent::OrdersChanged);
    }
    Ok(ok(result))
}

/// GET /api/u502/export
pub async fn u502_export(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let csv = u502_spreadsheet_sync::export_csv(&state.db).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"repair-orders.csv\"",
            ),
        ],
        csv,
    ))
}

// ============================================================================
// UseCase u503: Dispatch notifications
// ============================================================================

/// POST /api/u503/dispatch
pub async fn u503_dispatch(State(state): State<AppState>) -> AppResult<Json<ActionResult<TaskRun>>> {
    Ok(ok(state.tasks.trigger(TaskKind::DispatchNotifications)))
}
