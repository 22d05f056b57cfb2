use crate::domain::a002_notification_queue::service as queue;
use crate::shared::error::AppResult;
use crate::shared::events::SharedPublisher;
use async_trait::async_trait;
use contracts::domain::a002_notification_queue::aggregate::{
    NotificationPayload, NotificationQueueItem, NotificationStatus,
};
use contracts::shared::events::AppEvent;
use contracts::usecases::u503_dispatch_notifications::DispatchSummary;
use sea_orm::DatabaseConnection;

/// Delivery channel for approved queue items
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, item: &NotificationQueueItem) -> AppResult<()>;
}

/// Sender that only writes the delivery to the log
pub struct LoggingSender;

#[async_trait]
impl NotificationSender for LoggingSender {
    async fn send(&self, item: &NotificationQueueItem) -> AppResult<()> {
        match &item.payload {
            NotificationPayload::EmailDraft(draft) => tracing::info!(
                "Email {} to {:?}: {}",
                item.id,
                draft.to,
                draft.subject
            ),
            NotificationPayload::TaskReminder(reminder) => tracing::info!(
                "Reminder {} for {}: {} (due {:?})",
                item.id,
                item.owner_user_id,
                reminder.title,
                reminder.due_date
            ),
        }
        Ok(())
    }
}

/// One pass over every approved item. Delivered items become `sent`;
/// failures stay approved for the next pass.
pub async fn dispatch_approved(
    db: &DatabaseConnection,
    sender: &dyn NotificationSender,
    events: &SharedPublisher,
) -> AppResult<DispatchSummary> {
    let approved = queue::list_by_status(db, NotificationStatus::Approved).await?;
    let mut summary = DispatchSummary::default();

    for item in &approved {
        let delivered = match sender.send(item).await {
            Ok(()) => queue::transition(db, item.id, NotificationStatus::Sent).await,
            Err(e) => Err(e),
        };
        match delivered {
            Ok(_) => {
                summary.sent += 1;
                events.publish(AppEvent::NotificationChanged {
                    id: item.id,
                    status: NotificationStatus::Sent,
                });
            }
            Err(e) => {
                tracing::warn!("Failed to dispatch notification {}: {}", item.id, e);
                summary.failed += 1;
                summary.errors.push(format!("{}: {}", item.id, e.user_message()));
            }
        }
    }

    tracing::info!(
        "Notification dispatch: sent={}, failed={}",
        summary.sent,
        summary.failed
    );
    Ok(summary)
}
