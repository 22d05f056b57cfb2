use super::repository;
use crate::shared::error::AppResult;
use contracts::domain::a001_repair_order::aggregate::RepairOrderId;
use contracts::domain::a003_activity_log::aggregate::{
    ActivityLogEntry, FieldChange, StatusHistoryEntry,
};
use sea_orm::DatabaseConnection;

pub const ACTION_CREATED: &str = "created";
pub const ACTION_UPDATED: &str = "updated";
pub const ACTION_ARCHIVED: &str = "archived";
pub const ACTION_DOCUMENT_UPLOADED: &str = "document_uploaded";

/// Single activity row without a field diff
pub async fn record_action(
    db: &DatabaseConnection,
    order_id: &RepairOrderId,
    action: &str,
    actor: &str,
) -> AppResult<()> {
    repository::insert_activity(db, order_id, action, None, actor).await?;
    Ok(())
}

/// One "updated" row per changed field
pub async fn record_changes(
    db: &DatabaseConnection,
    order_id: &RepairOrderId,
    changes: &[FieldChange],
    actor: &str,
) -> AppResult<()> {
    for change in changes {
        repository::insert_activity(db, order_id, ACTION_UPDATED, Some(change), actor).await?;
    }
    Ok(())
}

pub async fn record_status_change(
    db: &DatabaseConnection,
    order_id: &RepairOrderId,
    old_status: Option<&str>,
    new_status: &str,
    actor: &str,
) -> AppResult<()> {
    repository::insert_status_change(db, order_id, old_status, new_status, actor).await?;
    Ok(())
}

pub async fn list_activity(
    db: &DatabaseConnection,
    order_id: &RepairOrderId,
) -> AppResult<Vec<ActivityLogEntry>> {
    Ok(repository::list_activity(db, order_id).await?)
}

pub async fn list_status_history(
    db: &DatabaseConnection,
    order_id: &RepairOrderId,
) -> AppResult<Vec<StatusHistoryEntry>> {
    Ok(repository::list_status_history(db, order_id).await?)
}

pub async fn count_activity(db: &DatabaseConnection, order_id: &RepairOrderId) -> AppResult<u64> {
    Ok(repository::count_activity(db, order_id).await?)
}
