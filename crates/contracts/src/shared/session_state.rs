use crate::dashboards::d400_order_stats::dto::OrderStats;
use serde::{Deserialize, Serialize};

/// Filters the user has selected on the order list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderFilters {
    pub search: Option<String>,
    pub status_group: Option<crate::enums::status_group::StatusGroup>,
    pub shop_name: Option<String>,
    pub overdue_only: bool,
}

/// Per-session view state (one per signed-in user)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub filters: OrderFilters,
    pub cached_stats: Option<OrderStats>,
    pub sync_in_progress: bool,
    /// Bumped on every write so subscribers can tell states apart
    pub revision: u64,
}
