use axum::extract::{Path, Query, State};
use axum::Json;
use contracts::domain::a002_notification_queue::aggregate::{
    NewNotification, NotificationId, NotificationQueueItem, NotificationStatus, TransitionRequest,
};
use contracts::shared::action_result::ActionResult;
use contracts::shared::events::AppEvent;
use contracts::system::auth::TokenClaims;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::a002_notification_queue::service;
use crate::shared::error::{ok, AppError, AppResult};
use crate::system::auth::CurrentUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
}

/// Item visible to the caller: its owner or an admin
async fn fetch_visible(
    state: &AppState,
    claims: &TokenClaims,
    id: Uuid,
) -> AppResult<NotificationQueueItem> {
    let id = NotificationId::new(id);
    service::fetch_by_id(&state.db, id)
        .await?
        .filter(|item| item.owner_user_id == claims.sub || claims.is_admin)
        .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))
}

/// GET /api/a002/notifications?status=
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(params): Query<ListParams>,
) -> AppResult<Json<ActionResult<Vec<NotificationQueueItem>>>> {
    let status = match params.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            NotificationStatus::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("Unknown status '{}'", raw)))?,
        ),
        None => None,
    };
    Ok(ok(service::list_for_owner(&state.db, &claims.sub, status).await?))
}

/// POST /api/a002/notifications
pub async fn enqueue(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(request): Json<NewNotification>,
) -> AppResult<Json<ActionResult<NotificationQueueItem>>> {
    let id = service::enqueue(&state.db, &claims.sub, request).await?;
    let item = fetch_visible(&state, &claims, id.value()).await?;
    state.events.publish(AppEvent::NotificationChanged {
        id,
        status: item.status,
    });
    Ok(ok(item))
}

/// GET /api/a002/notifications/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ActionResult<NotificationQueueItem>>> {
    Ok(ok(fetch_visible(&state, &claims, id).await?))
}

/// POST /api/a002/notifications/:id/transition
///
/// User-requested transitions must follow the approval flow.
pub async fn transition(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> AppResult<Json<ActionResult<NotificationQueueItem>>> {
    let item = fetch_visible(&state, &claims, id).await?;
    if !item.status.can_transition_to(request.status) {
        return Err(AppError::Validation(format!(
            "Cannot move notification from {} to {}",
            item.status, request.status
        )));
    }

    service::transition(&state.db, item.id, request.status).await?;
    state.events.publish(AppEvent::NotificationChanged {
        id: item.id,
        status: request.status,
    });
    Ok(ok(fetch_visible(&state, &claims, id).await?))
}
