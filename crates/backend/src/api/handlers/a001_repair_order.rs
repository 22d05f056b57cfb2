use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use contracts::domain::a001_repair_order::aggregate::{NewRepairOrderDto, RepairOrder, RepairOrderPatch};
use contracts::domain::a003_activity_log::aggregate::{ActivityLogEntry, StatusHistoryEntry};
use contracts::shared::action_result::ActionResult;
use contracts::shared::events::AppEvent;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::a001_repair_order::repository::{RepairOrderListQuery, RepairOrderListResult};
use crate::domain::a001_repair_order::service;
use crate::domain::a003_activity_log::service as activity;
use crate::shared::error::{ok, AppError, AppResult};
use crate::shared::storage::StoredDocument;
use crate::system::auth::CurrentUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub shop_name: Option<String>,
    #[serde(default)]
    pub include_archived: bool,
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_desc: bool,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl From<ListParams> for RepairOrderListQuery {
    fn from(p: ListParams) -> Self {
        let defaults = RepairOrderListQuery::default();
        Self {
            search: p.search.filter(|s| !s.trim().is_empty()),
            shop_name: p.shop_name.filter(|s| !s.trim().is_empty()),
            include_archived: p.include_archived,
            sort_by: p.sort_by.unwrap_or(defaults.sort_by),
            sort_desc: p.sort_desc,
            limit: p.limit.unwrap_or(defaults.limit).min(1000),
            offset: p.offset.unwrap_or(0),
        }
    }
}

/// GET /api/a001/repair-orders
pub async fn list_paginated(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<ActionResult<RepairOrderListResult>>> {
    let query = RepairOrderListQuery::from(params);
    Ok(ok(service::list_paginated(&state.db, &query).await?))
}

/// POST /api/a001/repair-orders
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(dto): Json<NewRepairOrderDto>,
) -> AppResult<Json<ActionResult<RepairOrder>>> {
    let order = service::create_manual(&state.db, dto, &claims.username).await?;
    state.events.publish(AppEvent::OrdersChanged);
    Ok(ok(order))
}

/// GET /api/a001/repair-orders/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ActionResult<RepairOrder>>> {
    Ok(ok(service::get_by_id(&state.db, id).await?))
}

/// PUT /api/a001/repair-orders/:id
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<RepairOrderPatch>,
) -> AppResult<Json<ActionResult<RepairOrder>>> {
    let order = service::update_fields(&state.db, id, patch, &claims.username).await?;
    state.events.publish(AppEvent::OrdersChanged);
    Ok(ok(order))
}

/// DELETE /api/a001/repair-orders/:id
pub async fn archive(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ActionResult<bool>>> {
    service::archive(&state.db, id, &claims.username).await?;
    state.events.publish(AppEvent::OrdersChanged);
    Ok(ok(true))
}

/// GET /api/a001/repair-orders/:id/activity
pub async fn activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ActionResult<Vec<ActivityLogEntry>>>> {
    let order = service::get_by_id(&state.db, id).await?;
    Ok(ok(activity::list_activity(&state.db, &order.base.id).await?))
}

/// GET /api/a001/repair-orders/:id/status-history
pub async fn status_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ActionResult<Vec<StatusHistoryEntry>>>> {
    let order = service::get_by_id(&state.db, id).await?;
    Ok(ok(activity::list_status_history(&state.db, &order.base.id).await?))
}

/// POST /api/a001/repair-orders/:id/documents (multipart, one or more files)
pub async fn upload_documents(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<Json<ActionResult<Vec<StoredDocument>>>> {
    let order = service::get_by_id(&state.db, id).await?;
    let mut stored = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {}", e)))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Upload of '{}' failed: {}", file_name, e)))?;
        let document = state.storage.put(order.ro_number(), &file_name, &bytes).await?;
        activity::record_action(
            &state.db,
            &order.base.id,
            activity::ACTION_DOCUMENT_UPLOADED,
            &claims.username,
        )
        .await?;
        stored.push(document);
    }

    if stored.is_empty() {
        return Err(AppError::Validation("No file in upload".into()));
    }
    Ok(ok(stored))
}

/// GET /api/a001/repair-orders/:id/documents
pub async fn list_documents(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ActionResult<Vec<StoredDocument>>>> {
    let order = service::get_by_id(&state.db, id).await?;
    Ok(ok(state.storage.list(order.ro_number()).await?))
}
