use crate::domain::a001_repair_order::service as orders;
use crate::shared::error::{AppError, AppResult};
use chrono::Utc;
use contracts::domain::a001_repair_order::aggregate::{RepairOrder, RepairOrderPatch};
use contracts::domain::common::Origin;
use contracts::usecases::u502_spreadsheet_sync::{
    ImportRowError, SpreadsheetImportResult, SPREADSHEET_COLUMNS,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

/// One spreadsheet line. Absent columns and empty cells leave the stored
/// value untouched.
#[derive(Debug, Default, Deserialize)]
struct SpreadsheetRow {
    #[serde(default)]
    ro_number: Option<String>,
    #[serde(default)]
    part_number: Option<String>,
    #[serde(default)]
    serial_number: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    shop_name: Option<String>,
    #[serde(default)]
    current_status: Option<String>,
    #[serde(default)]
    estimated_cost: Option<String>,
    #[serde(default)]
    next_update_due: Option<String>,
}

enum RowOutcome {
    Created,
    Updated,
    Unchanged,
}

/// "$1,250.00" -> 1250.0
fn parse_cost(raw: &str) -> Result<f64, String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    cleaned
        .parse::<f64>()
        .map_err(|_| format!("Invalid estimated_cost '{}'", raw.trim()))
}

fn cell(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn row_to_patch(row: &SpreadsheetRow) -> Result<RepairOrderPatch, String> {
    let estimated_cost = match cell(&row.estimated_cost) {
        Some(raw) => Some(Some(parse_cost(&raw)?)),
        None => None,
    };
    Ok(RepairOrderPatch {
        description: cell(&row.description),
        part_number: cell(&row.part_number),
        serial_number: cell(&row.serial_number),
        shop_name: cell(&row.shop_name),
        current_status: cell(&row.current_status),
        estimated_cost,
        final_cost: None,
        next_update_due: cell(&row.next_update_due).map(Some),
        comment: None,
    })
}

async fn import_row(
    db: &DatabaseConnection,
    row: &SpreadsheetRow,
    actor: &str,
) -> AppResult<RowOutcome> {
    let ro_number = cell(&row.ro_number)
        .ok_or_else(|| AppError::Validation("ro_number is empty".into()))?;
    let patch = row_to_patch(row).map_err(AppError::Validation)?;

    match orders::find_by_ro_number(db, &ro_number).await? {
        Some(mut order) => {
            let changes = orders::apply_patch(&mut order, &patch);
            if changes.is_empty() {
                return Ok(RowOutcome::Unchanged);
            }
            order.validate().map_err(AppError::Validation)?;
            if changes.iter().any(|c| c.field == orders::FIELD_STATUS) {
                order.status_changed_at = Some(Utc::now());
            }
            orders::persist_changes(db, &mut order, &changes, actor).await?;
            Ok(RowOutcome::Updated)
        }
        None => {
            let mut order = RepairOrder::new(ro_number, String::new(), Origin::Spreadsheet);
            orders::apply_patch(&mut order, &patch);
            if !order.current_status.is_empty() {
                order.status_changed_at = Some(Utc::now());
            }
            orders::insert_new(db, &order, actor).await?;
            Ok(RowOutcome::Created)
        }
    }
}

/// Upsert every CSV row keyed by RO number. A bad row is reported and
/// skipped; it never stops the import.
pub async fn import_csv(
    db: &DatabaseConnection,
    data: &[u8],
    actor: &str,
) -> AppResult<SpreadsheetImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| AppError::Validation(format!("Unreadable CSV header: {}", e)))?
        .clone();
    if !headers.iter().any(|h| h == "ro_number") {
        return Err(AppError::Validation(
            "CSV header must contain a ro_number column".into(),
        ));
    }

    let mut result = SpreadsheetImportResult::default();

    for (idx, record) in reader.deserialize::<SpreadsheetRow>().enumerate() {
        let row_no = idx + 1;
        let outcome = match record {
            Ok(row) => import_row(db, &row, actor)
                .await
                .map_err(|e| (cell(&row.ro_number), e.user_message())),
            Err(e) => Err((None, format!("Malformed row: {}", e))),
        };

        match outcome {
            Ok(RowOutcome::Created) => result.created += 1,
            Ok(RowOutcome::Updated) => result.updated += 1,
            Ok(RowOutcome::Unchanged) => result.unchanged += 1,
            Err((ro_number, message)) => {
                tracing::warn!("Spreadsheet row {} rejected: {}", row_no, message);
                result.failed += 1;
                result.errors.push(ImportRowError {
                    row: row_no,
                    ro_number,
                    message,
                });
            }
        }
    }

    tracing::info!(
        "Spreadsheet import: created={}, updated={}, unchanged={}, failed={}",
        result.created,
        result.updated,
        result.unchanged,
        result.failed
    );
    Ok(result)
}

/// Active orders as CSV with the import column layout
pub async fn export_csv(db: &DatabaseConnection) -> AppResult<String> {
    let active = orders::list_active(db).await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(SPREADSHEET_COLUMNS)
        .map_err(|e| AppError::Internal(e.into()))?;

    for order in &active {
        let cost = order
            .estimated_cost
            .map(|c| format!("{}", c))
            .unwrap_or_default();
        writer
            .write_record([
                order.ro_number(),
                order.part_number.as_str(),
                order.serial_number.as_str(),
                order.base.description.as_str(),
                order.shop_name.as_str(),
                order.current_status.as_str(),
                cost.as_str(),
                order.next_update_due.as_deref().unwrap_or_default(),
            ])
            .map_err(|e| AppError::Internal(e.into()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("CSV flush failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a003_activity_log::service as activity;
    use crate::shared::data::db::test_support::memory_db;

    const SHEET: &str = "\
ro_number,part_number,serial_number,description,shop_name,current_status,estimated_cost,next_update_due
RO-100,HP-220,SN-1,Hydraulic pump,Acme Repair,WAITING QUOTE,\"$1,250.00\",2024-07-01
RO-101,GEN-5,SN-9,Generator,Volt Works,IN WORK,800,07/15/2024
";

    #[test]
    fn test_parse_cost() {
        assert_eq!(parse_cost("$1,250.00").unwrap(), 1250.0);
        assert_eq!(parse_cost(" 80.5 ").unwrap(), 80.5);
        assert!(parse_cost("n/a").is_err());
    }

    #[tokio::test]
    async fn test_import_creates_then_reimport_is_unchanged() {
        let db = memory_db().await;

        let first = import_csv(&db, SHEET.as_bytes(), "alice").await.unwrap();
        assert_eq!(first.created, 2);
        assert_eq!(first.failed, 0);

        let order = orders::find_by_ro_number(&db, "RO-100").await.unwrap().unwrap();
        assert_eq!(order.origin, Origin::Spreadsheet);
        assert_eq!(order.estimated_cost, Some(1250.0));
        assert_eq!(order.current_status, "WAITING QUOTE");

        let second = import_csv(&db, SHEET.as_bytes(), "alice").await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.unchanged, 2);
        assert_eq!(activity::count_activity(&db, &order.base.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_bad_rows_are_isolated() {
        let db = memory_db().await;
        let sheet = "\
ro_number,current_status,estimated_cost
RO-1,IN WORK,100
RO-2,IN WORK,lots
,SHIPPED,5
RO-3,SHIPPED,-4
RO-4,SHIPPED,40
";
        let result = import_csv(&db, sheet.as_bytes(), "alice").await.unwrap();
        assert_eq!(result.created, 2);
        assert_eq!(result.failed, 3);
        let rows: Vec<_> = result.errors.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![2, 3, 4]);
        assert_eq!(result.errors[0].ro_number.as_deref(), Some("RO-2"));
        assert!(orders::find_by_ro_number(&db, "RO-4").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_touches_only_present_cells() {
        let db = memory_db().await;
        import_csv(&db, SHEET.as_bytes(), "alice").await.unwrap();

        let sheet = "ro_number,current_status\nRO-100,IN WORK\n";
        let result = import_csv(&db, sheet.as_bytes(), "bob").await.unwrap();
        assert_eq!(result.updated, 1);

        let order = orders::find_by_ro_number(&db, "RO-100").await.unwrap().unwrap();
        assert_eq!(order.current_status, "IN WORK");
        assert_eq!(order.part_number, "HP-220");
        let history = activity::list_status_history(&db, &order.base.id).await.unwrap();
        assert_eq!(history[0].actor, "bob");
    }

    #[tokio::test]
    async fn test_missing_ro_number_column_is_rejected() {
        let db = memory_db().await;
        let result = import_csv(&db, b"part_number\nHP-1\n", "alice").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_export_reimports_unchanged() {
        let db = memory_db().await;
        import_csv(&db, SHEET.as_bytes(), "alice").await.unwrap();

        let exported = export_csv(&db).await.unwrap();
        assert!(exported.starts_with(&SPREADSHEET_COLUMNS.join(",")));
        assert!(exported.contains("RO-101,GEN-5,SN-9,Generator,Volt Works,IN WORK,800,07/15/2024"));

        let result = import_csv(&db, exported.as_bytes(), "alice").await.unwrap();
        assert_eq!(result.unchanged, 2);
        assert_eq!(result.failed, 0);
    }
}
