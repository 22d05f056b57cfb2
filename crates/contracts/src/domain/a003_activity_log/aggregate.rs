use crate::domain::a001_repair_order::aggregate::RepairOrderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit row describing one change to a repair order. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: String,
    pub repair_order_id: RepairOrderId,
    /// "created", "updated", "archived", "document_uploaded", ...
    pub action: String,
    pub field: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

/// Status change of a repair order. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub id: String,
    pub repair_order_id: RepairOrderId,
    pub old_status: Option<String>,
    pub new_status: String,
    pub actor: String,
    pub changed_at: DateTime<Utc>,
}

/// Field-level change computed before it is written to the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: &'static str,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl FieldChange {
    pub fn new(field: &'static str, old_value: Option<String>, new_value: Option<String>) -> Self {
        Self {
            field,
            old_value,
            new_value,
        }
    }
}
