use serde::{Deserialize, Serialize};

/// Bulk reconciliation request. Empty fields fall back to configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncAllRequest {
    pub page_size: Option<u32>,
    /// Delay between page requests, milliseconds
    pub page_delay_ms: Option<u64>,
}
