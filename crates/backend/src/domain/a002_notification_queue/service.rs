use super::repository;
use crate::domain::a001_repair_order::service as orders;
use crate::shared::error::{AppError, AppResult};
use chrono::Utc;
use contracts::domain::a002_notification_queue::aggregate::{
    NewNotification, NotificationId, NotificationPayload, NotificationQueueItem,
    NotificationStatus,
};
use sea_orm::DatabaseConnection;

fn validate_payload(payload: &NotificationPayload) -> AppResult<()> {
    match payload {
        NotificationPayload::EmailDraft(draft) => {
            if draft.to.iter().all(|r| r.trim().is_empty()) {
                return Err(AppError::Validation("Email draft needs at least one recipient".into()));
            }
            if draft.subject.trim().is_empty() {
                return Err(AppError::Validation("Email draft subject is empty".into()));
            }
        }
        NotificationPayload::TaskReminder(reminder) => {
            if reminder.title.trim().is_empty() {
                return Err(AppError::Validation("Task reminder title is empty".into()));
            }
        }
    }
    Ok(())
}

/// Strip scripts and unsafe markup from email bodies before storage
fn sanitize_payload(payload: NotificationPayload) -> NotificationPayload {
    match payload {
        NotificationPayload::EmailDraft(mut draft) => {
            draft.body_html = ammonia::clean(&draft.body_html);
            NotificationPayload::EmailDraft(draft)
        }
        other => other,
    }
}

/// Queue an action for approval; returns the new item's id.
///
/// Status defaults to `pending_approval`; the type follows the payload.
pub async fn enqueue(
    db: &DatabaseConnection,
    owner_user_id: &str,
    request: NewNotification,
) -> AppResult<NotificationId> {
    validate_payload(&request.payload)?;
    orders::get_by_id(db, request.repair_order_id.value()).await?;

    let now = Utc::now();
    let payload = sanitize_payload(request.payload);
    let item = NotificationQueueItem {
        id: NotificationId::new_v4(),
        owner_user_id: owner_user_id.to_string(),
        repair_order_id: request.repair_order_id,
        notification_type: payload.notification_type(),
        status: request.status.unwrap_or(NotificationStatus::PendingApproval),
        payload,
        created_at: now,
        updated_at: now,
        decided_at: None,
        sent_at: None,
    };

    repository::insert(db, &item).await?;
    tracing::info!(
        "Queued {} {} for order {} (owner {})",
        item.notification_type.as_str(),
        item.id,
        item.repair_order_id,
        owner_user_id
    );
    Ok(item.id)
}

/// Move an item to `status`. `false` when no item has this id.
///
/// Any status may follow any other here; forward-only checks belong to
/// callers acting on user input (`NotificationStatus::can_transition_to`).
pub async fn transition(
    db: &DatabaseConnection,
    id: NotificationId,
    status: NotificationStatus,
) -> AppResult<bool> {
    let updated = repository::update_status(db, &id, status).await?;
    if updated {
        tracing::info!("Notification {} -> {}", id, status);
    }
    Ok(updated)
}

pub async fn fetch_by_id(
    db: &DatabaseConnection,
    id: NotificationId,
) -> AppResult<Option<NotificationQueueItem>> {
    Ok(repository::get_by_id(db, &id).await?)
}

pub async fn list_for_owner(
    db: &DatabaseConnection,
    owner_user_id: &str,
    status: Option<NotificationStatus>,
) -> AppResult<Vec<NotificationQueueItem>> {
    Ok(repository::list_for_owner(db, owner_user_id, status).await?)
}

pub async fn list_by_status(
    db: &DatabaseConnection,
    status: NotificationStatus,
) -> AppResult<Vec<NotificationQueueItem>> {
    Ok(repository::list_by_status(db, status).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::test_support::memory_db;
    use contracts::domain::a001_repair_order::aggregate::{NewRepairOrderDto, RepairOrderId};
    use contracts::domain::a002_notification_queue::aggregate::{
        EmailDraft, NotificationType, TaskReminder,
    };

    async fn order(db: &DatabaseConnection) -> RepairOrderId {
        let dto = NewRepairOrderDto {
            ro_number: "RO-5001".into(),
            ..Default::default()
        };
        orders::create_manual(db, dto, "test").await.unwrap().base.id
    }

    fn email(order: RepairOrderId, body: &str) -> NewNotification {
        NewNotification {
            repair_order_id: order,
            payload: NotificationPayload::EmailDraft(EmailDraft {
                to: vec!["shop@example.com".into()],
                cc: vec![],
                subject: "Quote status for RO-5001".into(),
                body_html: body.into(),
            }),
            status: None,
        }
    }

    #[tokio::test]
    async fn test_enqueue_defaults_to_pending_approval() {
        let db = memory_db().await;
        let ro = order(&db).await;

        let id = enqueue(&db, "user-1", email(ro, "<p>Hello</p>")).await.unwrap();
        let item = fetch_by_id(&db, id).await.unwrap().unwrap();

        assert_eq!(item.status, NotificationStatus::PendingApproval);
        assert_eq!(item.notification_type, NotificationType::EmailDraft);
        assert_eq!(item.owner_user_id, "user-1");
        assert!(item.decided_at.is_none());
    }

    #[tokio::test]
    async fn test_transition_to_sent_is_visible() {
        let db = memory_db().await;
        let ro = order(&db).await;
        let id = enqueue(&db, "user-1", email(ro, "hi")).await.unwrap();

        assert!(transition(&db, id, NotificationStatus::Sent).await.unwrap());

        let item = fetch_by_id(&db, id).await.unwrap().unwrap();
        assert_eq!(item.status, NotificationStatus::Sent);
        assert!(item.sent_at.is_some());
    }

    #[tokio::test]
    async fn test_transition_unknown_id_returns_false() {
        let db = memory_db().await;
        let updated = transition(&db, NotificationId::new_v4(), NotificationStatus::Approved)
            .await
            .unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn test_email_body_is_sanitized() {
        let db = memory_db().await;
        let ro = order(&db).await;
        let id = enqueue(
            &db,
            "user-1",
            email(ro, "<p>Quote attached</p><script>alert(1)</script>"),
        )
        .await
        .unwrap();

        let item = fetch_by_id(&db, id).await.unwrap().unwrap();
        match item.payload {
            NotificationPayload::EmailDraft(draft) => {
                assert!(draft.body_html.contains("<p>Quote attached</p>"));
                assert!(!draft.body_html.contains("script"));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_for_owner_filters_by_owner_and_status() {
        let db = memory_db().await;
        let ro = order(&db).await;
        let reminder = NewNotification {
            repair_order_id: ro,
            payload: NotificationPayload::TaskReminder(TaskReminder {
                title: "Call the shop".into(),
                notes: String::new(),
                due_date: None,
            }),
            status: Some(NotificationStatus::Approved),
        };
        enqueue(&db, "user-1", email(ro, "a")).await.unwrap();
        enqueue(&db, "user-1", reminder).await.unwrap();
        enqueue(&db, "user-2", email(ro, "b")).await.unwrap();

        assert_eq!(list_for_owner(&db, "user-1", None).await.unwrap().len(), 2);
        let approved = list_for_owner(&db, "user-1", Some(NotificationStatus::Approved))
            .await
            .unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].notification_type, NotificationType::TaskReminder);
        assert_eq!(list_for_owner(&db, "user-2", None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_enqueue_rejects_empty_recipients() {
        let db = memory_db().await;
        let ro = order(&db).await;
        let mut request = email(ro, "x");
        if let NotificationPayload::EmailDraft(draft) = &mut request.payload {
            draft.to.clear();
        }
        let result = enqueue(&db, "user-1", request).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
