use anyhow::Result;
use chrono::Utc;
use contracts::domain::a001_repair_order::aggregate::{RepairOrder, RepairOrderId};
use contracts::domain::common::{AggregateId, BaseAggregate, EntityMetadata, Origin};
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, EntityTrait, Order, PaginatorTrait, QueryOrder, QuerySelect, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a001_repair_order")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub external_id: Option<String>,
    pub part_number: String,
    pub serial_number: String,
    pub shop_name: String,
    pub vendor_ref: Option<String>,
    pub current_status: String,
    pub status_changed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub estimated_cost: Option<f64>,
    pub final_cost: Option<f64>,
    pub next_update_due: Option<String>,
    pub origin: String,
    pub is_deleted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for RepairOrder {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());

        RepairOrder {
            base: BaseAggregate::with_metadata(
                RepairOrderId::new(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            external_id: m.external_id,
            part_number: m.part_number,
            serial_number: m.serial_number,
            shop_name: m.shop_name,
            vendor_ref: m.vendor_ref,
            current_status: m.current_status,
            status_changed_at: m.status_changed_at,
            estimated_cost: m.estimated_cost,
            final_cost: m.final_cost,
            next_update_due: m.next_update_due,
            origin: Origin::from_str_lossy(&m.origin),
        }
    }
}

fn to_active_model(order: &RepairOrder) -> ActiveModel {
    ActiveModel {
        id: Set(order.base.id.as_string()),
        code: Set(order.base.code.clone()),
        description: Set(order.base.description.clone()),
        comment: Set(order.base.comment.clone()),
        external_id: Set(order.external_id.clone()),
        part_number: Set(order.part_number.clone()),
        serial_number: Set(order.serial_number.clone()),
        shop_name: Set(order.shop_name.clone()),
        vendor_ref: Set(order.vendor_ref.clone()),
        current_status: Set(order.current_status.clone()),
        status_changed_at: Set(order.status_changed_at),
        estimated_cost: Set(order.estimated_cost),
        final_cost: Set(order.final_cost),
        next_update_due: Set(order.next_update_due.clone()),
        origin: Set(order.origin.as_str().to_string()),
        is_deleted: Set(order.base.metadata.is_deleted),
        created_at: Set(Some(order.base.metadata.created_at)),
        updated_at: Set(Some(order.base.metadata.updated_at)),
        version: Set(order.base.metadata.version),
    }
}

pub async fn get_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<RepairOrder>> {
    let model = Entity::find_by_id(id.to_string()).one(db).await?;
    Ok(model.map(|m| m.into()))
}

pub async fn find_by_external_id(
    db: &DatabaseConnection,
    external_id: &str,
) -> Result<Option<RepairOrder>> {
    let model = Entity::find()
        .filter(Column::ExternalId.eq(external_id))
        .one(db)
        .await?;
    Ok(model.map(|m| m.into()))
}

pub async fn find_by_ro_number(
    db: &DatabaseConnection,
    ro_number: &str,
) -> Result<Option<RepairOrder>> {
    let model = Entity::find()
        .filter(Column::Code.eq(ro_number))
        .one(db)
        .await?;
    Ok(model.map(|m| m.into()))
}

pub async fn insert(db: &DatabaseConnection, order: &RepairOrder) -> Result<()> {
    Entity::insert(to_active_model(order)).exec(db).await?;
    Ok(())
}

/// Full-row update; bumps the version
pub async fn update(db: &DatabaseConnection, order: &RepairOrder) -> Result<()> {
    let mut active = to_active_model(order);
    active.updated_at = Set(Some(Utc::now()));
    active.version = Set(order.base.metadata.version + 1);
    active.created_at = sea_orm::ActiveValue::NotSet;
    Entity::update(active).exec(db).await?;
    Ok(())
}

pub async fn set_deleted(db: &DatabaseConnection, id: &str, is_deleted: bool) -> Result<bool> {
    let Some(model) = Entity::find_by_id(id).one(db).await? else {
        return Ok(false);
    };
    let version = model.version;
    let mut active: ActiveModel = model.into();
    active.is_deleted = Set(is_deleted);
    active.updated_at = Set(Some(Utc::now()));
    active.version = Set(version + 1);
    Entity::update(active).exec(db).await?;
    Ok(true)
}

/// Every order that is not archived, by RO number
pub async fn list_active(db: &DatabaseConnection) -> Result<Vec<RepairOrder>> {
    let models = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .order_by_asc(Column::Code)
        .all(db)
        .await?;
    Ok(models.into_iter().map(|m| m.into()).collect())
}

pub async fn count_all(db: &DatabaseConnection) -> Result<u64> {
    Ok(Entity::find().count(db).await?)
}

pub async fn count_active(db: &DatabaseConnection) -> Result<u64> {
    Ok(Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .count(db)
        .await?)
}

/// List query parameters
#[derive(Debug, Clone)]
pub struct RepairOrderListQuery {
    pub search: Option<String>,
    pub shop_name: Option<String>,
    pub include_archived: bool,
    pub sort_by: String,
    pub sort_desc: bool,
    pub limit: u64,
    pub offset: u64,
}

impl Default for RepairOrderListQuery {
    fn default() -> Self {
        Self {
            search: None,
            shop_name: None,
            include_archived: false,
            sort_by: "ro_number".to_string(),
            sort_desc: false,
            limit: 100,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RepairOrderListResult {
    pub items: Vec<RepairOrder>,
    pub total: u64,
}

fn sort_column(sort_by: &str) -> Column {
    match sort_by {
        "shop_name" => Column::ShopName,
        "current_status" => Column::CurrentStatus,
        "next_update_due" => Column::NextUpdateDue,
        "estimated_cost" => Column::EstimatedCost,
        "updated_at" => Column::UpdatedAt,
        "created_at" => Column::CreatedAt,
        _ => Column::Code,
    }
}

/// Filtered, sorted page plus the total matching count
pub async fn list_paginated(
    db: &DatabaseConnection,
    query: &RepairOrderListQuery,
) -> Result<RepairOrderListResult> {
    let mut condition = Condition::all();
    if !query.include_archived {
        condition = condition.add(Column::IsDeleted.eq(false));
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(Column::Code.contains(search))
                .add(Column::Description.contains(search))
                .add(Column::PartNumber.contains(search))
                .add(Column::SerialNumber.contains(search))
                .add(Column::ShopName.contains(search)),
        );
    }
    if let Some(shop) = query.shop_name.as_deref().filter(|s| !s.is_empty()) {
        condition = condition.add(Column::ShopName.eq(shop));
    }

    let total = Entity::find().filter(condition.clone()).count(db).await?;

    let order = if query.sort_desc { Order::Desc } else { Order::Asc };
    let models = Entity::find()
        .filter(condition)
        .order_by(sort_column(&query.sort_by), order)
        .order_by_asc(Column::Id)
        .limit(query.limit)
        .offset(query.offset)
        .all(db)
        .await?;

    Ok(RepairOrderListResult {
        items: models.into_iter().map(|m| m.into()).collect(),
        total,
    })
}
