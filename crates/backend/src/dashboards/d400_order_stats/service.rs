use super::due_date::{parse_due_date, DueDate};
use super::repository;
use crate::domain::a001_repair_order::service as orders;
use crate::shared::error::AppResult;
use chrono::NaiveDate;
use contracts::dashboards::d400_order_stats::dto::{
    DateParseFailure, DiagnosticsReport, OrderStats, StatusCount,
};
use contracts::domain::a001_repair_order::aggregate::RepairOrder;
use contracts::enums::status_group::{classify, counts_toward_value_in_work};
use sea_orm::DatabaseConnection;

/// Parse failures kept in the diagnostics report
const MAX_FAILURE_SAMPLES: usize = 20;

/// Value totals closer than this are considered equal
const VALUE_EPSILON: f64 = 0.005;

/// Single pass over the orders. `today` decides what is overdue.
pub fn compute_stats(orders: &[RepairOrder], today: NaiveDate) -> OrderStats {
    compute_stats_with_failures(orders, today).0
}

/// Same as [`compute_stats`], also returning the unparseable due dates
pub fn compute_stats_with_failures(
    orders: &[RepairOrder],
    today: NaiveDate,
) -> (OrderStats, Vec<DateParseFailure>) {
    let mut stats = OrderStats::default();
    let mut failures = Vec::new();

    for order in orders {
        let status = Some(order.current_status.as_str());
        let membership = classify(status);
        stats.waiting_quote_count += membership.waiting_quote as u32;
        stats.in_work_count += membership.in_work as u32;
        stats.shipped_count += membership.shipped as u32;
        stats.approved_count += membership.approved as u32;

        if counts_toward_value_in_work(status) {
            stats.value_in_work += order.estimated_cost.unwrap_or(0.0);
        }

        match parse_due_date(order.next_update_due.as_deref()) {
            DueDate::Unparseable => {
                stats.unparseable_due_dates += 1;
                failures.push(DateParseFailure {
                    ro_number: order.ro_number().to_string(),
                    raw_value: order.next_update_due.clone().unwrap_or_default(),
                });
            }
            due if due.is_overdue(today) => stats.overdue_count += 1,
            _ => {}
        }
    }

    (stats, failures)
}

/// Dashboard numbers from per-status SQL totals plus a per-row due-date check.
///
/// Each distinct status is classified once, with the same rules as
/// [`compute_stats`].
pub async fn primary_stats(db: &DatabaseConnection, today: NaiveDate) -> AppResult<OrderStats> {
    let totals = repository::status_totals(db).await?;
    let mut stats = OrderStats::default();

    for row in &totals {
        let status = Some(row.status.as_str());
        let count = row.cnt as u32;
        let membership = classify(status);
        stats.waiting_quote_count += membership.waiting_quote as u32 * count;
        stats.in_work_count += membership.in_work as u32 * count;
        stats.shipped_count += membership.shipped as u32 * count;
        stats.approved_count += membership.approved as u32 * count;
        if counts_toward_value_in_work(status) {
            stats.value_in_work += row.cost_total;
        }
    }

    for row in repository::due_dates(db).await? {
        match parse_due_date(row.next_update_due.as_deref()) {
            DueDate::Unparseable => stats.unparseable_due_dates += 1,
            due if due.is_overdue(today) => stats.overdue_count += 1,
            _ => {}
        }
    }
    Ok(stats)
}

/// Recomputation over the loaded active set
pub async fn forensic_stats(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> AppResult<(OrderStats, Vec<DateParseFailure>)> {
    let active = orders::list_active(db).await?;
    Ok(compute_stats_with_failures(&active, today))
}

pub fn stats_agree(a: &OrderStats, b: &OrderStats) -> bool {
    a.overdue_count == b.overdue_count
        && a.waiting_quote_count == b.waiting_quote_count
        && a.in_work_count == b.in_work_count
        && a.shipped_count == b.shipped_count
        && a.approved_count == b.approved_count
        && a.unparseable_due_dates == b.unparseable_due_dates
        && (a.value_in_work - b.value_in_work).abs() < VALUE_EPSILON
}

pub async fn diagnostics(db: &DatabaseConnection, today: NaiveDate) -> AppResult<DiagnosticsReport> {
    let (stats, mut failures) = forensic_stats(db, today).await?;
    let primary = primary_stats(db, today).await?;
    let stats_match = stats_agree(&stats, &primary);
    if !stats_match {
        tracing::warn!(
            "Dashboard aggregate disagrees with recomputation: primary={:?} forensic={:?}",
            primary,
            stats
        );
    }
    failures.truncate(MAX_FAILURE_SAMPLES);

    Ok(DiagnosticsReport {
        total_orders: orders::count_all(db).await? as u32,
        active_orders: orders::count_active(db).await? as u32,
        status_distribution: repository::status_totals(db)
            .await?
            .into_iter()
            .map(|row| StatusCount {
                status: row.status,
                count: row.cnt as u32,
            })
            .collect(),
        date_parse_failures: failures,
        stats,
        primary_stats: primary,
        stats_match,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::test_support::memory_db;
    use contracts::domain::a001_repair_order::aggregate::NewRepairOrderDto;
    use contracts::domain::common::Origin;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn order(status: &str, cost: Option<f64>, due: Option<&str>) -> RepairOrder {
        let mut o = RepairOrder::new(format!("RO-{status}"), String::new(), Origin::Manual);
        o.current_status = status.to_string();
        o.estimated_cost = cost;
        o.next_update_due = due.map(str::to_string);
        o
    }

    #[test]
    fn test_group_counts_and_value() {
        let orders = vec![
            order("WAITING QUOTE", Some(100.0), None),
            order("in work", Some(250.5), None),
            order("Approved >>>", Some(50.0), None),
            order("PAID", Some(1000.0), None),
            order("returned", Some(10.0), None),
            order("", None, None),
        ];
        let stats = compute_stats(&orders, today());
        assert_eq!(stats.waiting_quote_count, 1);
        assert_eq!(stats.in_work_count, 1);
        assert_eq!(stats.approved_count, 1);
        assert_eq!(stats.shipped_count, 0);
        assert_eq!(stats.value_in_work, 400.5);
    }

    #[test]
    fn test_overdue_excludes_unparseable_dates() {
        let orders = vec![
            order("IN WORK", None, Some("2024-05-01")),
            order("IN WORK", None, Some("05/31/2024")),
            order("IN WORK", None, Some("2024-06-01")),
            order("IN WORK", None, Some("someday")),
            order("IN WORK", None, Some("")),
            order("IN WORK", None, None),
        ];
        let (stats, failures) = compute_stats_with_failures(&orders, today());
        assert_eq!(stats.overdue_count, 2);
        assert_eq!(stats.unparseable_due_dates, 1);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].raw_value, "someday");
    }

    async fn seed(db: &DatabaseConnection) {
        let rows = [
            ("RO-1", "WAITING QUOTE", Some(100.5), Some("2024-05-01")),
            ("RO-2", " waiting quote ", Some(20.25), Some("not a date")),
            ("RO-3", "IN WORK", Some(1200.0), Some("06/15/2024")),
            ("RO-4", "Shipped", None, Some("2024-05-31T12:00:00Z")),
            ("RO-5", "APPROVED - PO 778", Some(300.0), None),
            ("RO-6", "APPROVE", Some(5.0), Some("2024-06-01 09:00:00")),
            ("RO-7", "BER", Some(999.0), Some("2023-01-01")),
            ("RO-8", "rai", Some(1.0), None),
            ("RO-9", "CLOSED", Some(40.0), Some("??")),
        ];
        for (ro, status, cost, due) in rows {
            let dto = NewRepairOrderDto {
                ro_number: ro.into(),
                current_status: status.into(),
                estimated_cost: cost,
                next_update_due: due.map(str::to_string),
                ..Default::default()
            };
            orders::create_manual(db, dto, "seed").await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_primary_and_forensic_paths_agree() {
        let db = memory_db().await;
        seed(&db).await;

        let primary = primary_stats(&db, today()).await.unwrap();
        let (forensic, _) = forensic_stats(&db, today()).await.unwrap();

        assert_eq!(primary, forensic);
        assert_eq!(primary.waiting_quote_count, 2);
        assert_eq!(primary.in_work_count, 1);
        assert_eq!(primary.shipped_count, 1);
        assert_eq!(primary.approved_count, 1);
        assert_eq!(primary.overdue_count, 3);
        assert_eq!(primary.unparseable_due_dates, 2);
        assert_eq!(primary.value_in_work, 1665.75);
    }

    #[tokio::test]
    async fn test_archived_orders_are_excluded() {
        let db = memory_db().await;
        seed(&db).await;
        let ro1 = orders::find_by_ro_number(&db, "RO-1").await.unwrap().unwrap();
        orders::archive(&db, ro1.base.id.value(), "seed").await.unwrap();

        let primary = primary_stats(&db, today()).await.unwrap();
        let (forensic, _) = forensic_stats(&db, today()).await.unwrap();
        assert_eq!(primary, forensic);
        assert_eq!(primary.waiting_quote_count, 1);
    }

    #[tokio::test]
    async fn test_paths_agree_on_unicode_whitespace() {
        let db = memory_db().await;
        let rows = [
            ("RO-20", "SHIPPED\u{a0}", Some(10.0)),
            ("RO-21", "\u{b}in work", Some(20.0)),
            ("RO-22", "\u{3000}Waiting Quote", Some(40.0)),
            ("RO-23", "paid\u{a0}", Some(500.0)),
            ("RO-24", "approved\u{2003}- ok", Some(1.5)),
        ];
        for (ro, status, cost) in rows {
            let dto = NewRepairOrderDto {
                ro_number: ro.into(),
                current_status: status.into(),
                estimated_cost: cost,
                ..Default::default()
            };
            orders::create_manual(&db, dto, "seed").await.unwrap();
        }

        let primary = primary_stats(&db, today()).await.unwrap();
        let (forensic, _) = forensic_stats(&db, today()).await.unwrap();
        assert_eq!(primary, forensic);
        assert_eq!(primary.shipped_count, 1);
        assert_eq!(primary.in_work_count, 1);
        assert_eq!(primary.waiting_quote_count, 1);
        assert_eq!(primary.approved_count, 1);
        assert_eq!(primary.value_in_work, 71.5);
    }

    #[tokio::test]
    async fn test_diagnostics_report() {
        let db = memory_db().await;
        seed(&db).await;

        let report = diagnostics(&db, today()).await.unwrap();
        assert!(report.stats_match);
        assert_eq!(report.total_orders, 9);
        assert_eq!(report.active_orders, 9);
        assert_eq!(report.date_parse_failures.len(), 2);
        let total: u32 = report.status_distribution.iter().map(|s| s.count).sum();
        assert_eq!(total, 9);
    }
}
