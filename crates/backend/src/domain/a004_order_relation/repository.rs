use anyhow::Result;
use chrono::Utc;
use contracts::domain::a001_repair_order::aggregate::RepairOrderId;
use contracts::domain::a004_order_relation::aggregate::{OrderRelation, RelationType};
use contracts::domain::common::AggregateId;
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a004_order_relation")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub source_order_id: String,
    pub target_order_id: String,
    pub relation_type: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn parse_order_id(raw: &str) -> RepairOrderId {
    RepairOrderId::from_string(raw).unwrap_or_else(|_| RepairOrderId::new(Uuid::nil()))
}

impl From<Model> for OrderRelation {
    fn from(m: Model) -> Self {
        OrderRelation {
            source_order_id: parse_order_id(&m.source_order_id),
            target_order_id: parse_order_id(&m.target_order_id),
            relation_type: RelationType::parse(&m.relation_type).unwrap_or(RelationType::Related),
            id: m.id,
            created_at: m.created_at,
        }
    }
}

pub async fn insert(
    db: &DatabaseConnection,
    source: &RepairOrderId,
    target: &RepairOrderId,
    relation_type: RelationType,
) -> Result<OrderRelation> {
    let model = Model {
        id: Uuid::new_v4().to_string(),
        source_order_id: source.as_string(),
        target_order_id: target.as_string(),
        relation_type: relation_type.as_str().to_string(),
        created_at: Utc::now(),
    };
    let active = ActiveModel {
        id: Set(model.id.clone()),
        source_order_id: Set(model.source_order_id.clone()),
        target_order_id: Set(model.target_order_id.clone()),
        relation_type: Set(model.relation_type.clone()),
        created_at: Set(model.created_at),
    };
    Entity::insert(active).exec(db).await?;
    Ok(model.into())
}

pub async fn exists(
    db: &DatabaseConnection,
    source: &RepairOrderId,
    target: &RepairOrderId,
    relation_type: RelationType,
) -> Result<bool> {
    let found = Entity::find()
        .filter(Column::SourceOrderId.eq(source.as_string()))
        .filter(Column::TargetOrderId.eq(target.as_string()))
        .filter(Column::RelationType.eq(relation_type.as_str()))
        .one(db)
        .await?;
    Ok(found.is_some())
}

/// Relations where the order is either source or target
pub async fn list_for_order(
    db: &DatabaseConnection,
    order_id: &RepairOrderId,
) -> Result<Vec<OrderRelation>> {
    let id = order_id.as_string();
    let rows = Entity::find()
        .filter(
            Condition::any()
                .add(Column::SourceOrderId.eq(id.clone()))
                .add(Column::TargetOrderId.eq(id)),
        )
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn delete(db: &DatabaseConnection, id: &str) -> Result<bool> {
    let result = Entity::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}
