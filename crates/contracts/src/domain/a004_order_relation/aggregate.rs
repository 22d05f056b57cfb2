use crate::domain::a001_repair_order::aggregate::RepairOrderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the source order relates to the target order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    /// Source replaces target (e.g. re-issued RO)
    Replaces,
    /// Source is an exchange unit sent for target
    ExchangeFor,
    /// Source is a warranty claim on target's repair
    WarrantyOf,
    Related,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Replaces => "replaces",
            RelationType::ExchangeFor => "exchange_for",
            RelationType::WarrantyOf => "warranty_of",
            RelationType::Related => "related",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "replaces" => Some(RelationType::Replaces),
            "exchange_for" => Some(RelationType::ExchangeFor),
            "warranty_of" => Some(RelationType::WarrantyOf),
            "related" => Some(RelationType::Related),
            _ => None,
        }
    }
}

/// Typed link between two repair orders (aggregate a004)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRelation {
    pub id: String,
    pub source_order_id: RepairOrderId,
    pub target_order_id: RepairOrderId,
    pub relation_type: RelationType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkOrdersRequest {
    pub target_order_id: RepairOrderId,
    pub relation_type: RelationType,
}
