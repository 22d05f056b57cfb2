use serde::{Deserialize, Serialize};

/// Outcome of one dispatch pass over approved notifications
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub sent: u32,
    pub failed: u32,
    pub errors: Vec<String>,
}
