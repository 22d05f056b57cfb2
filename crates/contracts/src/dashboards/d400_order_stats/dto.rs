use serde::{Deserialize, Serialize};

/// Summary statistics over the active-order set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderStats {
    /// Orders whose next-update-due date parsed and lies before today
    pub overdue_count: u32,
    pub waiting_quote_count: u32,
    pub in_work_count: u32,
    pub shipped_count: u32,
    pub approved_count: u32,
    /// Sum of estimated cost, terminal statuses excluded
    pub value_in_work: f64,
    /// Orders whose due date is present but could not be parsed.
    /// Never counted as overdue.
    pub unparseable_due_dates: u32,
}

/// Orders carrying one raw status value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: u32,
}

/// Sample of a due date that failed to parse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateParseFailure {
    pub ro_number: String,
    pub raw_value: String,
}

/// Body of the diagnostics endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    pub total_orders: u32,
    pub active_orders: u32,
    pub status_distribution: Vec<StatusCount>,
    pub date_parse_failures: Vec<DateParseFailure>,
    /// Forensics recomputation over the active set
    pub stats: OrderStats,
    /// Aggregate reported by the primary dashboard query
    pub primary_stats: OrderStats,
    pub stats_match: bool,
}
