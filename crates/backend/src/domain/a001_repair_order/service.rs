use super::repository;
use crate::domain::a003_activity_log::service as activity;
use crate::shared::error::{AppError, AppResult};
use chrono::Utc;
use contracts::domain::a001_repair_order::aggregate::{
    NewRepairOrderDto, RepairOrder, RepairOrderPatch,
};
use contracts::domain::a003_activity_log::aggregate::FieldChange;
use contracts::domain::common::Origin;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

pub use repository::{RepairOrderListQuery, RepairOrderListResult};

pub const FIELD_STATUS: &str = "current_status";

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn fmt_cost(v: Option<f64>) -> Option<String> {
    v.map(|c| format!("{}", c))
}

/// Assign `new` to a text field, recording the change
pub fn set_text(changes: &mut Vec<FieldChange>, field: &'static str, slot: &mut String, new: &str) {
    if slot.as_str() != new {
        changes.push(FieldChange::new(field, non_empty(slot), non_empty(new)));
        *slot = new.to_string();
    }
}

pub fn set_opt_text(
    changes: &mut Vec<FieldChange>,
    field: &'static str,
    slot: &mut Option<String>,
    new: Option<String>,
) {
    if *slot != new {
        changes.push(FieldChange::new(field, slot.clone(), new.clone()));
        *slot = new;
    }
}

pub fn set_cost(
    changes: &mut Vec<FieldChange>,
    field: &'static str,
    slot: &mut Option<f64>,
    new: Option<f64>,
) {
    if *slot != new {
        changes.push(FieldChange::new(field, fmt_cost(*slot), fmt_cost(new)));
        *slot = new;
    }
}

/// Apply a patch in memory and return the field-level diff
pub fn apply_patch(order: &mut RepairOrder, patch: &RepairOrderPatch) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    if let Some(v) = &patch.description {
        set_text(&mut changes, "description", &mut order.base.description, v);
    }
    if let Some(v) = &patch.part_number {
        set_text(&mut changes, "part_number", &mut order.part_number, v);
    }
    if let Some(v) = &patch.serial_number {
        set_text(&mut changes, "serial_number", &mut order.serial_number, v);
    }
    if let Some(v) = &patch.shop_name {
        set_text(&mut changes, "shop_name", &mut order.shop_name, v);
    }
    if let Some(v) = &patch.current_status {
        set_text(&mut changes, FIELD_STATUS, &mut order.current_status, v);
    }
    if let Some(v) = patch.estimated_cost {
        set_cost(&mut changes, "estimated_cost", &mut order.estimated_cost, v);
    }
    if let Some(v) = patch.final_cost {
        set_cost(&mut changes, "final_cost", &mut order.final_cost, v);
    }
    if let Some(v) = &patch.next_update_due {
        set_opt_text(&mut changes, "next_update_due", &mut order.next_update_due, v.clone());
    }
    if let Some(v) = &patch.comment {
        set_opt_text(&mut changes, "comment", &mut order.base.comment, v.clone());
    }

    changes
}

/// Store an order mutated in memory and append its audit rows.
///
/// The row update and the audit inserts are separate writes.
pub async fn persist_changes(
    db: &DatabaseConnection,
    order: &mut RepairOrder,
    changes: &[FieldChange],
    actor: &str,
) -> AppResult<()> {
    if changes.is_empty() {
        return Ok(());
    }

    repository::update(db, order).await?;
    order.base.metadata.version += 1;
    order.base.touch();

    activity::record_changes(db, &order.base.id, changes, actor).await?;

    if let Some(status) = changes.iter().find(|c| c.field == FIELD_STATUS) {
        activity::record_status_change(
            db,
            &order.base.id,
            status.old_value.as_deref(),
            status.new_value.as_deref().unwrap_or_default(),
            actor,
        )
        .await?;
    }
    Ok(())
}

/// Insert a new order with its "created" activity row and first status
pub async fn insert_new(db: &DatabaseConnection, order: &RepairOrder, actor: &str) -> AppResult<()> {
    order.validate().map_err(AppError::Validation)?;

    if repository::find_by_ro_number(db, order.ro_number()).await?.is_some() {
        return Err(AppError::Validation(format!(
            "Repair order {} already exists",
            order.ro_number()
        )));
    }

    repository::insert(db, order).await?;
    activity::record_action(db, &order.base.id, activity::ACTION_CREATED, actor).await?;
    if !order.current_status.is_empty() {
        activity::record_status_change(db, &order.base.id, None, &order.current_status, actor)
            .await?;
    }
    Ok(())
}

pub async fn create_manual(
    db: &DatabaseConnection,
    dto: NewRepairOrderDto,
    actor: &str,
) -> AppResult<RepairOrder> {
    let mut order = RepairOrder::new(dto.ro_number.trim().to_string(), dto.description, Origin::Manual);
    order.part_number = dto.part_number;
    order.serial_number = dto.serial_number;
    order.shop_name = dto.shop_name;
    order.estimated_cost = dto.estimated_cost;
    order.next_update_due = dto.next_update_due.filter(|s| !s.trim().is_empty());
    order.base.comment = dto.comment;
    if !dto.current_status.is_empty() {
        order.current_status = dto.current_status;
        order.status_changed_at = Some(Utc::now());
    }

    insert_new(db, &order, actor).await?;
    tracing::info!("Created repair order {} ({})", order.ro_number(), order.to_string_id());
    Ok(order)
}

pub async fn update_fields(
    db: &DatabaseConnection,
    id: Uuid,
    patch: RepairOrderPatch,
    actor: &str,
) -> AppResult<RepairOrder> {
    let mut order = get_by_id(db, id).await?;
    let changes = apply_patch(&mut order, &patch);
    order.validate().map_err(AppError::Validation)?;

    if changes.iter().any(|c| c.field == FIELD_STATUS) {
        order.status_changed_at = Some(Utc::now());
    }
    persist_changes(db, &mut order, &changes, actor).await?;

    tracing::info!(
        "Updated repair order {}: {} field(s) changed",
        order.ro_number(),
        changes.len()
    );
    Ok(order)
}

/// Soft delete
pub async fn archive(db: &DatabaseConnection, id: Uuid, actor: &str) -> AppResult<()> {
    let order = get_by_id(db, id).await?;
    if order.base.metadata.is_deleted {
        return Ok(());
    }
    repository::set_deleted(db, &id.to_string(), true).await?;
    activity::record_action(db, &order.base.id, activity::ACTION_ARCHIVED, actor).await?;
    tracing::info!("Archived repair order {}", order.ro_number());
    Ok(())
}

pub async fn get_by_id(db: &DatabaseConnection, id: Uuid) -> AppResult<RepairOrder> {
    repository::get_by_id(db, id)
        .await?
        .ok_or_else(|| AppError::not_found::<RepairOrder>(id))
}

pub async fn find_by_external_id(
    db: &DatabaseConnection,
    external_id: &str,
) -> AppResult<Option<RepairOrder>> {
    Ok(repository::find_by_external_id(db, external_id).await?)
}

pub async fn find_by_ro_number(
    db: &DatabaseConnection,
    ro_number: &str,
) -> AppResult<Option<RepairOrder>> {
    Ok(repository::find_by_ro_number(db, ro_number).await?)
}

pub async fn list_active(db: &DatabaseConnection) -> AppResult<Vec<RepairOrder>> {
    Ok(repository::list_active(db).await?)
}

pub async fn list_paginated(
    db: &DatabaseConnection,
    query: &RepairOrderListQuery,
) -> AppResult<RepairOrderListResult> {
    Ok(repository::list_paginated(db, query).await?)
}

pub async fn count_all(db: &DatabaseConnection) -> AppResult<u64> {
    Ok(repository::count_all(db).await?)
}

pub async fn count_active(db: &DatabaseConnection) -> AppResult<u64> {
    Ok(repository::count_active(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::test_support::memory_db;
    use sea_orm::EntityTrait;

    fn dto(ro: &str) -> NewRepairOrderDto {
        NewRepairOrderDto {
            ro_number: ro.into(),
            description: "Hydraulic pump".into(),
            part_number: "HP-220".into(),
            shop_name: "Acme Repair".into(),
            current_status: "WAITING QUOTE".into(),
            estimated_cost: Some(1200.0),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_writes_activity_and_status_history() {
        let db = memory_db().await;
        let order = create_manual(&db, dto("RO-1001"), "alice").await.unwrap();

        let log = activity::list_activity(&db, &order.base.id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action, "created");

        let history = activity::list_status_history(&db, &order.base.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].new_status, "WAITING QUOTE");
    }

    #[tokio::test]
    async fn test_duplicate_and_blank_ro_numbers_are_rejected() {
        let db = memory_db().await;
        create_manual(&db, dto("RO-1001"), "alice").await.unwrap();

        let dup = create_manual(&db, dto("RO-1001"), "alice").await;
        assert!(matches!(dup, Err(AppError::Validation(_))));

        let blank = create_manual(&db, dto("   "), "alice").await;
        assert!(matches!(blank, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_logs_each_changed_field() {
        let db = memory_db().await;
        let order = create_manual(&db, dto("RO-1002"), "alice").await.unwrap();

        let patch = RepairOrderPatch {
            current_status: Some("IN WORK".into()),
            estimated_cost: Some(Some(1500.0)),
            shop_name: Some("Acme Repair".into()),
            ..Default::default()
        };
        let updated = update_fields(&db, order.base.id.value(), patch, "bob").await.unwrap();
        assert_eq!(updated.current_status, "IN WORK");
        assert!(updated.status_changed_at.is_some());

        let log = activity::list_activity(&db, &order.base.id).await.unwrap();
        // created + two changed fields; shop_name unchanged
        assert_eq!(log.len(), 3);
        let fields: Vec<_> = log.iter().filter_map(|e| e.field.as_deref()).collect();
        assert!(fields.contains(&"current_status"));
        assert!(fields.contains(&"estimated_cost"));

        let history = activity::list_status_history(&db, &order.base.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].old_status.as_deref(), Some("WAITING QUOTE"));
        assert_eq!(history[0].new_status, "IN WORK");
    }

    #[tokio::test]
    async fn test_negative_cost_patch_is_rejected() {
        let db = memory_db().await;
        let order = create_manual(&db, dto("RO-1003"), "alice").await.unwrap();
        let patch = RepairOrderPatch {
            estimated_cost: Some(Some(-1.0)),
            ..Default::default()
        };
        let result = update_fields(&db, order.base.id.value(), patch, "bob").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_archive_hides_order_from_active_list() {
        let db = memory_db().await;
        let a = create_manual(&db, dto("RO-1"), "alice").await.unwrap();
        create_manual(&db, dto("RO-2"), "alice").await.unwrap();

        archive(&db, a.base.id.value(), "alice").await.unwrap();

        let active = list_active(&db).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].ro_number(), "RO-2");
        assert_eq!(count_all(&db).await.unwrap(), 2);
        assert!(get_by_id(&db, a.base.id.value()).await.unwrap().base.metadata.is_deleted);
    }

    #[tokio::test]
    async fn test_missing_order_is_not_found() {
        let db = memory_db().await;
        let result = get_by_id(&db, Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_paginated_search_and_total() {
        let db = memory_db().await;
        for i in 1..=5 {
            create_manual(&db, dto(&format!("RO-{i:03}")), "alice").await.unwrap();
        }
        let mut other = dto("XX-900");
        other.part_number = "GEAR-7".into();
        create_manual(&db, other, "alice").await.unwrap();

        let page = list_paginated(
            &db,
            &RepairOrderListQuery {
                search: Some("RO-".into()),
                limit: 2,
                offset: 2,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.total, 5);
        let codes: Vec<_> = page.items.iter().map(|o| o.ro_number()).collect();
        assert_eq!(codes, vec!["RO-003", "RO-004"]);

        let by_part = list_paginated(
            &db,
            &RepairOrderListQuery {
                search: Some("gear".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_part.total, 1);
    }

    #[tokio::test]
    async fn test_deleting_order_cascades_audit_rows() {
        let db = memory_db().await;
        let order = create_manual(&db, dto("RO-77"), "alice").await.unwrap();
        assert_eq!(activity::count_activity(&db, &order.base.id).await.unwrap(), 1);

        repository::Entity::delete_by_id(order.to_string_id())
            .exec(&db)
            .await
            .unwrap();

        assert_eq!(activity::count_activity(&db, &order.base.id).await.unwrap(), 0);
        assert!(activity::list_status_history(&db, &order.base.id)
            .await
            .unwrap()
            .is_empty());
    }
}
