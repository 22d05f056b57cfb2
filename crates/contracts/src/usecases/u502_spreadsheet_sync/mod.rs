pub mod response;

pub use response::{ImportRowError, SpreadsheetImportResult};

/// Column order shared by import and export
pub const SPREADSHEET_COLUMNS: [&str; 8] = [
    "ro_number",
    "part_number",
    "serial_number",
    "description",
    "shop_name",
    "current_status",
    "estimated_cost",
    "next_update_due",
];
