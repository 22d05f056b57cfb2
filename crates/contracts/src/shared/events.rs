use crate::domain::a002_notification_queue::aggregate::{NotificationId, NotificationStatus};
use crate::usecases::u501_sync_from_erp::response::SyncAllSummary;
use serde::{Deserialize, Serialize};

/// Named events pushed to subscribers (dashboards, task progress streams).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// Cached views over repair orders must be refreshed
    OrdersChanged,
    SyncProgress {
        run_id: String,
        processed: u32,
        created: u32,
        updated: u32,
        failed: u32,
    },
    SyncFinished {
        run_id: String,
        summary: SyncAllSummary,
    },
    NotificationChanged {
        id: NotificationId,
        status: NotificationStatus,
    },
    TaskFinished {
        run_id: String,
        success: bool,
        message: Option<String>,
    },
}

impl AppEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::OrdersChanged => "orders_changed",
            AppEvent::SyncProgress { .. } => "sync_progress",
            AppEvent::SyncFinished { .. } => "sync_finished",
            AppEvent::NotificationChanged { .. } => "notification_changed",
            AppEvent::TaskFinished { .. } => "task_finished",
        }
    }

    /// Run the event belongs to, for events scoped to a background task
    pub fn run_id(&self) -> Option<&str> {
        match self {
            AppEvent::SyncProgress { run_id, .. }
            | AppEvent::SyncFinished { run_id, .. }
            | AppEvent::TaskFinished { run_id, .. } => Some(run_id),
            _ => None,
        }
    }
}
