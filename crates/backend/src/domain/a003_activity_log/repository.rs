use anyhow::Result;
use chrono::Utc;
use contracts::domain::a001_repair_order::aggregate::RepairOrderId;
use contracts::domain::a003_activity_log::aggregate::{
    ActivityLogEntry, FieldChange, StatusHistoryEntry,
};
use contracts::domain::common::AggregateId;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

pub mod activity {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "a003_activity_log")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub repair_order_id: String,
        pub action: String,
        pub field: Option<String>,
        pub old_value: Option<String>,
        pub new_value: Option<String>,
        pub actor: String,
        pub created_at: chrono::DateTime<chrono::Utc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod status_history {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "a003_status_history")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub repair_order_id: String,
        pub old_status: Option<String>,
        pub new_status: String,
        pub actor: String,
        pub changed_at: chrono::DateTime<chrono::Utc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

fn parse_order_id(raw: &str) -> RepairOrderId {
    RepairOrderId::from_string(raw).unwrap_or_else(|_| RepairOrderId::new(Uuid::nil()))
}

impl From<activity::Model> for ActivityLogEntry {
    fn from(m: activity::Model) -> Self {
        ActivityLogEntry {
            repair_order_id: parse_order_id(&m.repair_order_id),
            id: m.id,
            action: m.action,
            field: m.field,
            old_value: m.old_value,
            new_value: m.new_value,
            actor: m.actor,
            created_at: m.created_at,
        }
    }
}

impl From<status_history::Model> for StatusHistoryEntry {
    fn from(m: status_history::Model) -> Self {
        StatusHistoryEntry {
            repair_order_id: parse_order_id(&m.repair_order_id),
            id: m.id,
            old_status: m.old_status,
            new_status: m.new_status,
            actor: m.actor,
            changed_at: m.changed_at,
        }
    }
}

pub async fn insert_activity(
    db: &DatabaseConnection,
    order_id: &RepairOrderId,
    action: &str,
    change: Option<&FieldChange>,
    actor: &str,
) -> Result<()> {
    let active = activity::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        repair_order_id: Set(order_id.as_string()),
        action: Set(action.to_string()),
        field: Set(change.map(|c| c.field.to_string())),
        old_value: Set(change.and_then(|c| c.old_value.clone())),
        new_value: Set(change.and_then(|c| c.new_value.clone())),
        actor: Set(actor.to_string()),
        created_at: Set(Utc::now()),
    };
    activity::Entity::insert(active).exec(db).await?;
    Ok(())
}

pub async fn insert_status_change(
    db: &DatabaseConnection,
    order_id: &RepairOrderId,
    old_status: Option<&str>,
    new_status: &str,
    actor: &str,
) -> Result<()> {
    let active = status_history::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        repair_order_id: Set(order_id.as_string()),
        old_status: Set(old_status.map(str::to_string)),
        new_status: Set(new_status.to_string()),
        actor: Set(actor.to_string()),
        changed_at: Set(Utc::now()),
    };
    status_history::Entity::insert(active).exec(db).await?;
    Ok(())
}

/// Newest first; rowid breaks ties between rows written in the same instant
pub async fn list_activity(
    db: &DatabaseConnection,
    order_id: &RepairOrderId,
) -> Result<Vec<ActivityLogEntry>> {
    let rows = activity::Entity::find()
        .filter(activity::Column::RepairOrderId.eq(order_id.as_string()))
        .order_by_desc(activity::Column::CreatedAt)
        .order_by(Expr::cust("rowid"), Order::Desc)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn list_status_history(
    db: &DatabaseConnection,
    order_id: &RepairOrderId,
) -> Result<Vec<StatusHistoryEntry>> {
    let rows = status_history::Entity::find()
        .filter(status_history::Column::RepairOrderId.eq(order_id.as_string()))
        .order_by_desc(status_history::Column::ChangedAt)
        .order_by(Expr::cust("rowid"), Order::Desc)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn count_activity(db: &DatabaseConnection, order_id: &RepairOrderId) -> Result<u64> {
    use sea_orm::PaginatorTrait;
    let count = activity::Entity::find()
        .filter(activity::Column::RepairOrderId.eq(order_id.as_string()))
        .count(db)
        .await?;
    Ok(count)
}
