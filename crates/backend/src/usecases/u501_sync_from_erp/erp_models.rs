//! Wire models of the ERP order API. Read-only snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErpStatus {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErpVendor {
    pub id: String,
    pub name: String,
}

/// Row of `GET /api/orders`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErpOrderSummary {
    pub id: String,
    pub order_no: String,
    pub status: ErpStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErpOrderListResponse {
    pub items: Vec<ErpOrderSummary>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErpPart {
    pub part_number: String,
    #[serde(default)]
    pub description: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub serials: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Body of `GET /api/orders/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErpOrderDetails {
    pub id: String,
    pub order_no: String,
    pub status: ErpStatus,
    #[serde(default)]
    pub vendor: Option<ErpVendor>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_update_due: Option<String>,
    #[serde(default)]
    pub parts: Vec<ErpPart>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErpTokenRequest<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErpTokenResponse {
    pub access_token: String,
    /// Lifetime in seconds
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

impl ErpOrderSummary {
    /// Semantic checks serde cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("order summary has an empty id".into());
        }
        Ok(())
    }
}

impl ErpOrderDetails {
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("order has an empty id".into());
        }
        if self.order_no.trim().is_empty() {
            return Err(format!("order {} has an empty order_no", self.id));
        }
        for part in &self.parts {
            if !part.quantity.is_finite() || part.quantity < 0.0 {
                return Err(format!(
                    "part {} of order {} has invalid quantity {}",
                    part.part_number, self.id, part.quantity
                ));
            }
            if let Some(price) = part.unit_price {
                if !price.is_finite() || price < 0.0 {
                    return Err(format!(
                        "part {} of order {} has invalid unit price {}",
                        part.part_number, self.id, price
                    ));
                }
            }
        }
        Ok(())
    }
}
