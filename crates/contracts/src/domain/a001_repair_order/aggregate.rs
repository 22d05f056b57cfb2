use crate::domain::common::{AggregateId, AggregateRoot, BaseAggregate, EntityMetadata, Origin};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::uuid_aggregate_id!(RepairOrderId);

/// Repair order (aggregate a001).
///
/// `base.code` holds the RO number, `base.description` the part description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairOrder {
    #[serde(flatten)]
    pub base: BaseAggregate<RepairOrderId>,

    /// ERP identifier; `None` means the order was never synced
    pub external_id: Option<String>,

    pub part_number: String,
    pub serial_number: String,

    /// Repair shop / vendor name
    pub shop_name: String,
    /// Vendor identifier in the ERP
    pub vendor_ref: Option<String>,

    /// Free-text status, normalized only when read
    pub current_status: String,
    pub status_changed_at: Option<DateTime<Utc>>,

    pub estimated_cost: Option<f64>,
    pub final_cost: Option<f64>,

    /// Next-update-due date as entered or synced; parsed at read time
    pub next_update_due: Option<String>,

    pub origin: Origin,
}

impl RepairOrder {
    pub fn new(ro_number: String, description: String, origin: Origin) -> Self {
        Self {
            base: BaseAggregate::new(RepairOrderId::new_v4(), ro_number, description),
            external_id: None,
            part_number: String::new(),
            serial_number: String::new(),
            shop_name: String::new(),
            vendor_ref: None,
            current_status: String::new(),
            status_changed_at: None,
            estimated_cost: None,
            final_cost: None,
            next_update_due: None,
            origin,
        }
    }

    pub fn ro_number(&self) -> &str {
        &self.base.code
    }

    pub fn to_string_id(&self) -> String {
        self.base.id.as_string()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.code.trim().is_empty() {
            return Err("RO number must not be empty".into());
        }
        if let Some(cost) = self.estimated_cost {
            if !cost.is_finite() || cost < 0.0 {
                return Err(format!("Estimated cost must be a non-negative number, got {}", cost));
            }
        }
        if let Some(cost) = self.final_cost {
            if !cost.is_finite() || cost < 0.0 {
                return Err(format!("Final cost must be a non-negative number, got {}", cost));
            }
        }
        Ok(())
    }
}

impl AggregateRoot for RepairOrder {
    type Id = RepairOrderId;

    fn id(&self) -> Self::Id {
        self.base.id
    }

    fn code(&self) -> &str {
        &self.base.code
    }

    fn description(&self) -> &str {
        &self.base.description
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.base.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.base.metadata
    }

    fn aggregate_index() -> &'static str {
        "a001"
    }

    fn collection_name() -> &'static str {
        "repair_order"
    }

    fn element_name() -> &'static str {
        "Repair order"
    }

    fn list_name() -> &'static str {
        "Repair orders"
    }
}

/// Manual entry payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRepairOrderDto {
    pub ro_number: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub part_number: String,
    #[serde(default)]
    pub serial_number: String,
    #[serde(default)]
    pub shop_name: String,
    #[serde(default)]
    pub current_status: String,
    pub estimated_cost: Option<f64>,
    pub next_update_due: Option<String>,
    pub comment: Option<String>,
}

/// Partial update. Absent fields are left untouched; `Some(None)` on an
/// optional column clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepairOrderPatch {
    pub description: Option<String>,
    pub part_number: Option<String>,
    pub serial_number: Option<String>,
    pub shop_name: Option<String>,
    pub current_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub estimated_cost: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub final_cost: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub next_update_due: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub comment: Option<Option<String>>,
}

impl RepairOrderPatch {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.part_number.is_none()
            && self.serial_number.is_none()
            && self.shop_name.is_none()
            && self.current_status.is_none()
            && self.estimated_cost.is_none()
            && self.final_cost.is_none()
            && self.next_update_due.is_none()
            && self.comment.is_none()
    }
}

/// Distinguishes a missing field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
