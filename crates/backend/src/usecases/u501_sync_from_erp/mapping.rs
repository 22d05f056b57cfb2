//! ERP order -> local repair order.
//!
//! | ERP field                 | local field                              |
//! |---------------------------|------------------------------------------|
//! | `id`                      | `external_id`                            |
//! | `order_no`                | `ro_number`                              |
//! | `status.name`             | `current_status`                         |
//! | `vendor.name`             | `shop_name`                              |
//! | `vendor.id`               | `vendor_ref`                             |
//! | `next_update_due`         | `next_update_due`                        |
//! | `updated_at`              | `status_changed_at` (on status change)   |
//! | `parts[0].part_number`    | `part_number`                            |
//! | `parts[0].serials[0]`     | `serial_number`                          |
//! | `parts[*].description`    | `description` (joined with "; ")         |
//! | `sum(quantity*unit_price)`| `estimated_cost`                         |
//!
//! Everything in [`DROPPED_FIELDS`] is intentionally not stored.

use super::erp_models::ErpOrderDetails;
use crate::domain::a001_repair_order::service::{set_cost, set_opt_text, set_text, FIELD_STATUS};
use chrono::Utc;
use contracts::domain::a001_repair_order::aggregate::RepairOrder;
use contracts::domain::a003_activity_log::aggregate::FieldChange;
use contracts::domain::common::Origin;

pub const DROPPED_FIELDS: &[&str] = &[
    "status.code",
    "created_at",
    "parts[*].tags",
    "parts[1..].part_number",
    "parts[*].serials[1..]",
];

pub fn joined_description(details: &ErpOrderDetails) -> String {
    details
        .parts
        .iter()
        .map(|p| p.description.trim())
        .filter(|d| !d.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Sum of quantity x unit price, in cents precision; `None` without parts
pub fn estimated_cost(details: &ErpOrderDetails) -> Option<f64> {
    if details.parts.is_empty() {
        return None;
    }
    let total: f64 = details
        .parts
        .iter()
        .map(|p| p.quantity * p.unit_price.unwrap_or(0.0))
        .sum();
    Some((total * 100.0).round() / 100.0)
}

/// Write every mapped field onto `order` and return what changed
pub fn apply_details(order: &mut RepairOrder, details: &ErpOrderDetails) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    let first_part = details.parts.first();

    set_opt_text(
        &mut changes,
        "external_id",
        &mut order.external_id,
        Some(details.id.clone()),
    );
    set_text(&mut changes, "ro_number", &mut order.base.code, details.order_no.trim());
    set_text(
        &mut changes,
        FIELD_STATUS,
        &mut order.current_status,
        details.status.name.trim(),
    );
    set_text(
        &mut changes,
        "shop_name",
        &mut order.shop_name,
        details.vendor.as_ref().map(|v| v.name.as_str()).unwrap_or_default(),
    );
    set_opt_text(
        &mut changes,
        "vendor_ref",
        &mut order.vendor_ref,
        details.vendor.as_ref().map(|v| v.id.clone()),
    );
    set_opt_text(
        &mut changes,
        "next_update_due",
        &mut order.next_update_due,
        details
            .next_update_due
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    );
    set_text(
        &mut changes,
        "part_number",
        &mut order.part_number,
        first_part.map(|p| p.part_number.as_str()).unwrap_or_default(),
    );
    set_text(
        &mut changes,
        "serial_number",
        &mut order.serial_number,
        first_part
            .and_then(|p| p.serials.first())
            .map(String::as_str)
            .unwrap_or_default(),
    );
    set_text(
        &mut changes,
        "description",
        &mut order.base.description,
        &joined_description(details),
    );
    set_cost(
        &mut changes,
        "estimated_cost",
        &mut order.estimated_cost,
        estimated_cost(details),
    );

    if changes.iter().any(|c| c.field == FIELD_STATUS) {
        order.status_changed_at = Some(details.updated_at.unwrap_or_else(Utc::now));
    }

    changes
}

/// Fresh local order for an ERP order seen for the first time
pub fn new_order(details: &ErpOrderDetails) -> RepairOrder {
    let mut order = RepairOrder::new(String::new(), String::new(), Origin::Erp);
    apply_details(&mut order, details);
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::u501_sync_from_erp::erp_models::{ErpPart, ErpStatus, ErpVendor};
    use chrono::TimeZone;

    fn details() -> ErpOrderDetails {
        ErpOrderDetails {
            id: "ext-1".into(),
            order_no: "RO-2001".into(),
            status: ErpStatus {
                code: "IW".into(),
                name: "IN WORK".into(),
            },
            vendor: Some(ErpVendor {
                id: "V-9".into(),
                name: "Acme Repair".into(),
            }),
            created_at: None,
            updated_at: Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()),
            next_update_due: Some("2024-03-15".into()),
            parts: vec![
                ErpPart {
                    part_number: "HP-220".into(),
                    description: "Hydraulic pump".into(),
                    quantity: 2.0,
                    unit_price: Some(150.25),
                    serials: vec!["SN-1".into(), "SN-2".into()],
                    tags: vec!["AOG".into()],
                },
                ErpPart {
                    part_number: "SEAL-1".into(),
                    description: "Seal kit".into(),
                    quantity: 1.0,
                    unit_price: Some(20.0),
                    serials: vec![],
                    tags: vec![],
                },
            ],
        }
    }

    #[test]
    fn test_new_order_maps_every_field() {
        let order = new_order(&details());
        assert_eq!(order.external_id.as_deref(), Some("ext-1"));
        assert_eq!(order.ro_number(), "RO-2001");
        assert_eq!(order.current_status, "IN WORK");
        assert_eq!(order.shop_name, "Acme Repair");
        assert_eq!(order.vendor_ref.as_deref(), Some("V-9"));
        assert_eq!(order.next_update_due.as_deref(), Some("2024-03-15"));
        assert_eq!(order.part_number, "HP-220");
        assert_eq!(order.serial_number, "SN-1");
        assert_eq!(order.base.description, "Hydraulic pump; Seal kit");
        assert_eq!(order.estimated_cost, Some(320.5));
        assert_eq!(order.origin, Origin::Erp);
        assert_eq!(
            order.status_changed_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_reapplying_same_snapshot_changes_nothing() {
        let snapshot = details();
        let mut order = new_order(&snapshot);
        assert!(apply_details(&mut order, &snapshot).is_empty());
    }

    #[test]
    fn test_status_change_is_reported() {
        let mut snapshot = details();
        let mut order = new_order(&snapshot);
        snapshot.status.name = "SHIPPED".into();
        snapshot.status.code = "SH".into();

        let changes = apply_details(&mut order, &snapshot);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, FIELD_STATUS);
        assert_eq!(changes[0].old_value.as_deref(), Some("IN WORK"));
        assert_eq!(changes[0].new_value.as_deref(), Some("SHIPPED"));
    }

    #[test]
    fn test_dropped_fields_do_not_produce_changes() {
        let mut snapshot = details();
        let mut order = new_order(&snapshot);
        snapshot.status.code = "ZZ".into();
        snapshot.parts[0].tags = vec!["RUSH".into()];
        snapshot.created_at = Some(Utc::now());
        assert!(apply_details(&mut order, &snapshot).is_empty());
    }
}
