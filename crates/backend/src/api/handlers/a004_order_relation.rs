use axum::extract::{Path, State};
use axum::Json;
use contracts::domain::a001_repair_order::aggregate::RepairOrderId;
use contracts::domain::a004_order_relation::aggregate::{LinkOrdersRequest, OrderRelation};
use contracts::shared::action_result::ActionResult;
use uuid::Uuid;

use crate::domain::a004_order_relation::service;
use crate::shared::error::{ok, AppResult};
use crate::AppState;

/// GET /api/a001/repair-orders/:id/relations
pub async fn list_for_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ActionResult<Vec<OrderRelation>>>> {
    Ok(ok(service::list_for_order(&state.db, RepairOrderId::new(id)).await?))
}

/// POST /api/a001/repair-orders/:id/relations
pub async fn link(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<LinkOrdersRequest>,
) -> AppResult<Json<ActionResult<OrderRelation>>> {
    let relation = service::link(
        &state.db,
        RepairOrderId::new(id),
        request.target_order_id,
        request.relation_type,
    )
    .await?;
    Ok(ok(relation))
}

/// DELETE /api/a004/relations/:id
pub async fn unlink(
    State(state): State<AppState>,
    Path(relation_id): Path<String>,
) -> AppResult<Json<ActionResult<bool>>> {
    service::unlink(&state.db, &relation_id).await?;
    Ok(ok(true))
}
