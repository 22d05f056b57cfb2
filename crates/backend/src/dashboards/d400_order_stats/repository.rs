use anyhow::Result;
use sea_orm::{DatabaseBackend, DatabaseConnection, FromQueryResult, Statement};

/// Order count and cost total of one raw status value
#[derive(Debug, Clone, FromQueryResult)]
pub struct StatusTotals {
    pub status: String,
    pub cnt: i64,
    pub cost_total: f64,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct DueDateRow {
    pub code: String,
    pub next_update_due: Option<String>,
}

/// Active orders grouped by their stored status text, most frequent first.
///
/// Statuses are not normalized here; callers classify each distinct value.
pub async fn status_totals(db: &DatabaseConnection) -> Result<Vec<StatusTotals>> {
    let stmt = Statement::from_string(
        DatabaseBackend::Sqlite,
        r#"
        SELECT current_status AS status,
               COUNT(*) AS cnt,
               TOTAL(estimated_cost) AS cost_total
        FROM a001_repair_order
        WHERE is_deleted = 0
        GROUP BY current_status
        ORDER BY cnt DESC, status ASC
        "#
        .to_string(),
    );
    Ok(StatusTotals::find_by_statement(stmt).all(db).await?)
}

/// Active orders that carry any due-date text
pub async fn due_dates(db: &DatabaseConnection) -> Result<Vec<DueDateRow>> {
    let stmt = Statement::from_string(
        DatabaseBackend::Sqlite,
        r#"
        SELECT code, next_update_due
        FROM a001_repair_order
        WHERE is_deleted = 0 AND next_update_due IS NOT NULL
        "#
        .to_string(),
    );
    Ok(DueDateRow::find_by_statement(stmt).all(db).await?)
}
