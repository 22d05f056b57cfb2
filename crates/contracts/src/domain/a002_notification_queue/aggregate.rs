use crate::domain::a001_repair_order::aggregate::RepairOrderId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

crate::uuid_aggregate_id!(NotificationId);

/// Kind of queued action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    EmailDraft,
    TaskReminder,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::EmailDraft => "email_draft",
            NotificationType::TaskReminder => "task_reminder",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "email_draft" => Some(NotificationType::EmailDraft),
            "task_reminder" => Some(NotificationType::TaskReminder),
            _ => None,
        }
    }
}

/// Approval state of a queued action.
///
/// Documented flow: `pending_approval -> approved | rejected -> sent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    PendingApproval,
    Approved,
    Rejected,
    Sent,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::PendingApproval => "pending_approval",
            NotificationStatus::Approved => "approved",
            NotificationStatus::Rejected => "rejected",
            NotificationStatus::Sent => "sent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending_approval" => Some(NotificationStatus::PendingApproval),
            "approved" => Some(NotificationStatus::Approved),
            "rejected" => Some(NotificationStatus::Rejected),
            "sent" => Some(NotificationStatus::Sent),
            _ => None,
        }
    }

    /// Forward-only rule of the approval flow.
    ///
    /// Not applied by the queue's `transition`; callers that accept
    /// transitions from users check it themselves.
    pub fn can_transition_to(&self, next: NotificationStatus) -> bool {
        use NotificationStatus::*;
        matches!(
            (self, next),
            (PendingApproval, Approved) | (PendingApproval, Rejected) | (Approved, Sent)
        )
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Draft of an outbound email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub to: Vec<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    pub subject: String,
    /// HTML body, sanitized before it is stored
    pub body_html: String,
}

/// Follow-up reminder for a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReminder {
    pub title: String,
    #[serde(default)]
    pub notes: String,
    pub due_date: Option<NaiveDate>,
}

/// Payload discriminated by notification type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum NotificationPayload {
    EmailDraft(EmailDraft),
    TaskReminder(TaskReminder),
}

impl NotificationPayload {
    pub fn notification_type(&self) -> NotificationType {
        match self {
            NotificationPayload::EmailDraft(_) => NotificationType::EmailDraft,
            NotificationPayload::TaskReminder(_) => NotificationType::TaskReminder,
        }
    }
}

/// Queued action awaiting human approval (aggregate a002)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationQueueItem {
    pub id: NotificationId,
    /// Exactly one owner
    pub owner_user_id: String,
    pub repair_order_id: RepairOrderId,
    pub notification_type: NotificationType,
    pub status: NotificationStatus,
    pub payload: NotificationPayload,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
}

/// Input of `enqueue`. Status defaults to pending approval when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    pub repair_order_id: RepairOrderId,
    pub payload: NotificationPayload,
    #[serde(default)]
    pub status: Option<NotificationStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub status: NotificationStatus,
}
