use crate::shared::config::{self, DatabaseConfig};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};
use std::time::Duration;

/// Tables created on startup, in dependency order
const SCHEMA: &[(&str, &str)] = &[
    (
        "a001_repair_order",
        r#"
        CREATE TABLE a001_repair_order (
            id TEXT PRIMARY KEY NOT NULL,
            code TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL DEFAULT '',
            comment TEXT,
            external_id TEXT UNIQUE,
            part_number TEXT NOT NULL DEFAULT '',
            serial_number TEXT NOT NULL DEFAULT '',
            shop_name TEXT NOT NULL DEFAULT '',
            vendor_ref TEXT,
            current_status TEXT NOT NULL DEFAULT '',
            status_changed_at TEXT,
            estimated_cost REAL,
            final_cost REAL,
            next_update_due TEXT,
            origin TEXT NOT NULL DEFAULT 'manual',
            is_deleted INTEGER NOT NULL DEFAULT 0,
            created_at TEXT,
            updated_at TEXT,
            version INTEGER NOT NULL DEFAULT 0
        );
        "#,
    ),
    (
        "a002_notification_queue",
        r#"
        CREATE TABLE a002_notification_queue (
            id TEXT PRIMARY KEY NOT NULL,
            owner_user_id TEXT NOT NULL,
            repair_order_id TEXT NOT NULL
                REFERENCES a001_repair_order(id) ON DELETE CASCADE,
            notification_type TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending_approval',
            payload TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            decided_at TEXT,
            sent_at TEXT
        );
        "#,
    ),
    (
        "a003_activity_log",
        r#"
        CREATE TABLE a003_activity_log (
            id TEXT PRIMARY KEY NOT NULL,
            repair_order_id TEXT NOT NULL
                REFERENCES a001_repair_order(id) ON DELETE CASCADE,
            action TEXT NOT NULL,
            field TEXT,
            old_value TEXT,
            new_value TEXT,
            actor TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    ),
    (
        "a003_status_history",
        r#"
        CREATE TABLE a003_status_history (
            id TEXT PRIMARY KEY NOT NULL,
            repair_order_id TEXT NOT NULL
                REFERENCES a001_repair_order(id) ON DELETE CASCADE,
            old_status TEXT,
            new_status TEXT NOT NULL,
            actor TEXT NOT NULL,
            changed_at TEXT NOT NULL
        );
        "#,
    ),
    (
        "a004_order_relation",
        r#"
        CREATE TABLE a004_order_relation (
            id TEXT PRIMARY KEY NOT NULL,
            source_order_id TEXT NOT NULL
                REFERENCES a001_repair_order(id) ON DELETE CASCADE,
            target_order_id TEXT NOT NULL
                REFERENCES a001_repair_order(id) ON DELETE CASCADE,
            relation_type TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (source_order_id, target_order_id, relation_type)
        );
        "#,
    ),
    (
        "sys_users",
        r#"
        CREATE TABLE sys_users (
            id TEXT PRIMARY KEY NOT NULL,
            username TEXT NOT NULL UNIQUE,
            email TEXT,
            password_hash TEXT NOT NULL,
            full_name TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            is_admin INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            last_login_at TEXT
        );
        "#,
    ),
    (
        "sys_refresh_tokens",
        r#"
        CREATE TABLE sys_refresh_tokens (
            id TEXT PRIMARY KEY NOT NULL,
            user_id TEXT NOT NULL REFERENCES sys_users(id) ON DELETE CASCADE,
            token_hash TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            revoked_at TEXT
        );
        "#,
    ),
    (
        "sys_settings",
        r#"
        CREATE TABLE sys_settings (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    ),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_a002_owner_status ON a002_notification_queue (owner_user_id, status);",
    "CREATE INDEX IF NOT EXISTS idx_a003_activity_order ON a003_activity_log (repair_order_id);",
    "CREATE INDEX IF NOT EXISTS idx_a003_status_order ON a003_status_history (repair_order_id);",
];

/// Open the pooled connection described by the config and bootstrap the schema
pub async fn initialize_database(cfg: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let db_file = config::resolve_path(&cfg.path);
    if let Some(parent) = db_file.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Normalize path separators and ensure proper URL form on Windows
    let normalized = db_file.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

    tracing::info!(
        "Opening database {} (pool max {} connections)",
        db_file.display(),
        cfg.max_connections
    );

    let conn = connect(&db_url, cfg.max_connections, cfg.acquire_timeout_secs).await?;
    bootstrap_schema(&conn).await?;
    Ok(conn)
}

/// Bounded pool: when every connection is busy callers wait up to
/// `acquire_timeout_secs` instead of opening new ones.
pub async fn connect(
    url: &str,
    max_connections: u32,
    acquire_timeout_secs: u64,
) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(url.to_string());
    options
        .max_connections(max_connections.max(1))
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
        .sqlx_logging(false);
    Ok(Database::connect(options).await?)
}

async fn table_exists(conn: &DatabaseConnection, table: &str) -> anyhow::Result<bool> {
    let rows = conn
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT name FROM sqlite_master WHERE type='table' AND name = ?",
            [table.into()],
        ))
        .await?;
    Ok(!rows.is_empty())
}

/// Ensure required tables exist (minimal schema bootstrap)
pub async fn bootstrap_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    conn.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        "PRAGMA foreign_keys = ON;".to_string(),
    ))
    .await?;

    for (table, ddl) in SCHEMA {
        if table_exists(conn, table).await? {
            continue;
        }
        tracing::info!("Creating {} table", table);
        conn.execute(Statement::from_string(DatabaseBackend::Sqlite, ddl.to_string()))
            .await?;
    }

    for ddl in INDEXES {
        conn.execute(Statement::from_string(DatabaseBackend::Sqlite, ddl.to_string()))
            .await?;
    }

    Ok(())
}

#[cfg(test)]
pub mod test_support {
    use super::*;

    /// Fresh in-memory database with the production schema.
    /// A single connection, so every statement sees the same memory DB.
    pub async fn memory_db() -> DatabaseConnection {
        let conn = connect("sqlite::memory:", 1, 5)
            .await
            .expect("in-memory sqlite");
        bootstrap_schema(&conn).await.expect("schema bootstrap");
        conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let conn = test_support::memory_db().await;
        bootstrap_schema(&conn).await.unwrap();
        for (table, _) in SCHEMA {
            assert!(table_exists(&conn, table).await.unwrap(), "{table} missing");
        }
    }
}
