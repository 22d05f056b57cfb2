use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Live progress of a bulk ERP sync
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncProgress {
    pub session_id: String,
    pub status: SyncStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,

    pub page: u32,
    pub processed: u32,
    pub created: u32,
    pub updated: u32,
    pub failed: u32,

    pub current_item: Option<String>,
    pub error_messages: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Running,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl SyncProgress {
    pub fn new(session_id: String) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            status: SyncStatus::Running,
            started_at: now,
            completed_at: None,
            updated_at: now,
            page: 0,
            processed: 0,
            created: 0,
            updated: 0,
            failed: 0,
            current_item: None,
            error_messages: Vec::new(),
        }
    }
}
