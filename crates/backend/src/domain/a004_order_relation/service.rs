use super::repository;
use crate::domain::a001_repair_order::service as orders;
use crate::shared::error::{AppError, AppResult};
use contracts::domain::a001_repair_order::aggregate::RepairOrderId;
use contracts::domain::a004_order_relation::aggregate::{OrderRelation, RelationType};
use sea_orm::DatabaseConnection;

/// Link two existing orders. Self-links and exact duplicates are rejected.
pub async fn link(
    db: &DatabaseConnection,
    source: RepairOrderId,
    target: RepairOrderId,
    relation_type: RelationType,
) -> AppResult<OrderRelation> {
    if source == target {
        return Err(AppError::Validation(
            "A repair order cannot be linked to itself".into(),
        ));
    }

    orders::get_by_id(db, source.value()).await?;
    orders::get_by_id(db, target.value()).await?;

    if repository::exists(db, &source, &target, relation_type).await? {
        return Err(AppError::Validation(format!(
            "Relation '{}' already exists",
            relation_type.as_str()
        )));
    }

    let relation = repository::insert(db, &source, &target, relation_type).await?;
    tracing::info!(
        "Linked {} -[{}]-> {}",
        source,
        relation_type.as_str(),
        target
    );
    Ok(relation)
}

pub async fn list_for_order(
    db: &DatabaseConnection,
    order_id: RepairOrderId,
) -> AppResult<Vec<OrderRelation>> {
    Ok(repository::list_for_order(db, &order_id).await?)
}

pub async fn unlink(db: &DatabaseConnection, relation_id: &str) -> AppResult<()> {
    if !repository::delete(db, relation_id).await? {
        return Err(AppError::NotFound(format!("Relation {} not found", relation_id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::test_support::memory_db;
    use contracts::domain::a001_repair_order::aggregate::NewRepairOrderDto;

    async fn order(db: &DatabaseConnection, ro: &str) -> RepairOrderId {
        let dto = NewRepairOrderDto {
            ro_number: ro.into(),
            ..Default::default()
        };
        orders::create_manual(db, dto, "test").await.unwrap().base.id
    }

    #[tokio::test]
    async fn test_self_link_is_rejected() {
        let db = memory_db().await;
        let a = order(&db, "RO-1").await;
        let result = link(&db, a, a, RelationType::Related).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_link_visible_from_both_sides() {
        let db = memory_db().await;
        let a = order(&db, "RO-1").await;
        let b = order(&db, "RO-2").await;

        link(&db, a, b, RelationType::Replaces).await.unwrap();
        let duplicate = link(&db, a, b, RelationType::Replaces).await;
        assert!(matches!(duplicate, Err(AppError::Validation(_))));

        assert_eq!(list_for_order(&db, a).await.unwrap().len(), 1);
        let from_target = list_for_order(&db, b).await.unwrap();
        assert_eq!(from_target.len(), 1);
        assert_eq!(from_target[0].source_order_id, a);
        assert_eq!(from_target[0].relation_type, RelationType::Replaces);
    }

    #[tokio::test]
    async fn test_unlink() {
        let db = memory_db().await;
        let a = order(&db, "RO-1").await;
        let b = order(&db, "RO-2").await;
        let rel = link(&db, a, b, RelationType::WarrantyOf).await.unwrap();

        unlink(&db, &rel.id).await.unwrap();
        assert!(list_for_order(&db, a).await.unwrap().is_empty());
        assert!(matches!(unlink(&db, &rel.id).await, Err(AppError::NotFound(_))));
    }
}
