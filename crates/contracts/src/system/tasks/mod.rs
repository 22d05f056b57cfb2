use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Background job kinds the dispatcher can start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    ErpSyncAll,
    DispatchNotifications,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::ErpSyncAll => "erp_sync_all",
            TaskKind::DispatchNotifications => "dispatch_notifications",
        }
    }
}

/// Handle returned by a fire-and-forget trigger.
///
/// `access_token` authorizes subscribing to this run's realtime events only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRun {
    pub run_id: String,
    pub access_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskRunStatus {
    Running,
    Completed,
    Failed,
}

/// Bookkeeping record of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRunInfo {
    pub run_id: String,
    pub kind: TaskKind,
    pub status: TaskRunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub message: Option<String>,
}
