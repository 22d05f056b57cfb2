use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use contracts::domain::a001_repair_order::aggregate::RepairOrderId;
use contracts::domain::a002_notification_queue::aggregate::{
    NotificationId, NotificationPayload, NotificationQueueItem, NotificationStatus,
    NotificationType,
};
use contracts::domain::common::AggregateId;
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, QueryResult, Statement, Value};

const SELECT_COLUMNS: &str = "SELECT id, owner_user_id, repair_order_id, notification_type, status, payload, \
     created_at, updated_at, decided_at, sent_at FROM a002_notification_queue";

fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid timestamp '{}'", raw))?
        .with_timezone(&Utc))
}

fn parse_opt_ts(raw: Option<String>) -> Result<Option<DateTime<Utc>>> {
    raw.as_deref().map(parse_ts).transpose()
}

fn row_to_item(row: &QueryResult) -> Result<NotificationQueueItem> {
    let id: String = row.try_get("", "id")?;
    let repair_order_id: String = row.try_get("", "repair_order_id")?;
    let notification_type: String = row.try_get("", "notification_type")?;
    let status: String = row.try_get("", "status")?;
    let payload: String = row.try_get("", "payload")?;
    let created_at: String = row.try_get("", "created_at")?;
    let updated_at: String = row.try_get("", "updated_at")?;

    Ok(NotificationQueueItem {
        id: NotificationId::from_string(&id).map_err(|e| anyhow!(e))?,
        owner_user_id: row.try_get("", "owner_user_id")?,
        repair_order_id: RepairOrderId::from_string(&repair_order_id).map_err(|e| anyhow!(e))?,
        notification_type: NotificationType::parse(&notification_type)
            .ok_or_else(|| anyhow!("Unknown notification type '{}'", notification_type))?,
        status: NotificationStatus::parse(&status)
            .ok_or_else(|| anyhow!("Unknown notification status '{}'", status))?,
        payload: serde_json::from_str::<NotificationPayload>(&payload)
            .with_context(|| format!("Corrupt payload of notification {}", id))?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
        decided_at: parse_opt_ts(row.try_get("", "decided_at")?)?,
        sent_at: parse_opt_ts(row.try_get("", "sent_at")?)?,
    })
}

pub async fn insert(db: &DatabaseConnection, item: &NotificationQueueItem) -> Result<()> {
    let payload = serde_json::to_string(&item.payload)?;
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO a002_notification_queue (id, owner_user_id, repair_order_id, notification_type, status, payload, created_at, updated_at, decided_at, sent_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        [
            item.id.as_string().into(),
            item.owner_user_id.clone().into(),
            item.repair_order_id.as_string().into(),
            item.notification_type.as_str().into(),
            item.status.as_str().into(),
            payload.into(),
            item.created_at.to_rfc3339().into(),
            item.updated_at.to_rfc3339().into(),
            item.decided_at.map(|t| t.to_rfc3339()).into(),
            item.sent_at.map(|t| t.to_rfc3339()).into(),
        ],
    ))
    .await
    .context("Failed to insert notification")?;
    Ok(())
}

/// Set the status; decision and delivery timestamps are stamped once
pub async fn update_status(
    db: &DatabaseConnection,
    id: &NotificationId,
    status: NotificationStatus,
) -> Result<bool> {
    let now = Utc::now().to_rfc3339();
    let decided_at: Option<String> = matches!(
        status,
        NotificationStatus::Approved | NotificationStatus::Rejected
    )
    .then(|| now.clone());
    let sent_at: Option<String> = (status == NotificationStatus::Sent).then(|| now.clone());

    let result = db
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "UPDATE a002_notification_queue
             SET status = ?, updated_at = ?,
                 decided_at = COALESCE(?, decided_at),
                 sent_at = COALESCE(?, sent_at)
             WHERE id = ?",
            [
                status.as_str().into(),
                now.into(),
                Value::from(decided_at),
                Value::from(sent_at),
                id.as_string().into(),
            ],
        ))
        .await
        .context("Failed to update notification status")?;
    Ok(result.rows_affected() > 0)
}

pub async fn get_by_id(db: &DatabaseConnection, id: &NotificationId) -> Result<Option<NotificationQueueItem>> {
    let row = db
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!("{} WHERE id = ?", SELECT_COLUMNS),
            [id.as_string().into()],
        ))
        .await?;
    row.as_ref().map(row_to_item).transpose()
}

pub async fn list_for_owner(
    db: &DatabaseConnection,
    owner_user_id: &str,
    status: Option<NotificationStatus>,
) -> Result<Vec<NotificationQueueItem>> {
    let stmt = match status {
        Some(status) => Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!(
                "{} WHERE owner_user_id = ? AND status = ? ORDER BY created_at DESC",
                SELECT_COLUMNS
            ),
            [owner_user_id.into(), status.as_str().into()],
        ),
        None => Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!("{} WHERE owner_user_id = ? ORDER BY created_at DESC", SELECT_COLUMNS),
            [owner_user_id.into()],
        ),
    };
    let rows = db.query_all(stmt).await?;
    rows.iter().map(row_to_item).collect()
}

/// Oldest first, across all owners
pub async fn list_by_status(
    db: &DatabaseConnection,
    status: NotificationStatus,
) -> Result<Vec<NotificationQueueItem>> {
    let rows = db
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!("{} WHERE status = ? ORDER BY created_at ASC", SELECT_COLUMNS),
            [status.as_str().into()],
        ))
        .await?;
    rows.iter().map(row_to_item).collect()
}
