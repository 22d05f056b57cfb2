use serde::{Deserialize, Serialize};

/// What reconciliation did with one external order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncAction {
    Create,
    Update,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncOneResult {
    pub action: SyncAction,
    pub local_id: String,
}

/// One item that failed during a bulk run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncFailure {
    pub external_id: String,
    pub message: String,
}

/// Outcome of a bulk run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncAllSummary {
    pub pages: u32,
    pub created: u32,
    pub updated: u32,
    pub failed: u32,
    pub failures: Vec<SyncFailure>,
    /// Set when a page fetch failed and the run stopped early
    pub aborted: Option<String>,
}

impl SyncAllSummary {
    pub fn succeeded(&self) -> u32 {
        self.created + self.updated
    }

    pub fn processed(&self) -> u32 {
        self.created + self.updated + self.failed
    }
}
