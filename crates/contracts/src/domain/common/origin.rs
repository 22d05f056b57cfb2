use serde::{Deserialize, Serialize};

/// Path through which a record entered the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Typed in by a user
    Manual,
    /// Imported from the tracking spreadsheet
    Spreadsheet,
    /// Created by ERP reconciliation
    Erp,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Manual => "manual",
            Origin::Spreadsheet => "spreadsheet",
            Origin::Erp => "erp",
        }
    }

    /// Unknown values fall back to `Manual`
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "spreadsheet" => Origin::Spreadsheet,
            "erp" => Origin::Erp,
            _ => Origin::Manual,
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
