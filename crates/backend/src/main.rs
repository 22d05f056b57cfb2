#![allow(clippy::type_complexity, clippy::too_many_arguments)]

use backend::shared::config::{load_config, resolve_path};
use backend::shared::data::db;
use backend::shared::events::BroadcastPublisher;
use backend::shared::session_store::InMemorySessionStore;
use backend::shared::storage::LocalFileStorage;
use backend::system;
use backend::system::tasks::{ScheduledSyncWorker, TaskDispatcher};
use backend::usecases::u501_sync_from_erp::{
    ErpApiClient, ErpSource, ProgressTracker, SyncExecutor, SyncOptions, UnconfiguredErp,
};
use backend::usecases::u503_dispatch_notifications::LoggingSender;
use backend::{routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use axum::http::{header, Method};
    use axum::middleware;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tower_http::cors::{Any, CorsLayer};

    system::tracing::initialize()?;

    let config = Arc::new(load_config()?);

    let conn = db::initialize_database(&config.database).await?;
    system::initialization::ensure_admin_user_exists(&conn, &config.auth).await?;

    let events = BroadcastPublisher::shared();

    let erp: Arc<dyn ErpSource> = match ErpApiClient::new(&config.erp) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::warn!("ERP sync disabled: {}", e);
            Arc::new(UnconfiguredErp)
        }
    };
    let sync = Arc::new(SyncExecutor::new(
        conn.clone(),
        erp,
        events.clone(),
        Arc::new(ProgressTracker::new()),
    ));

    let sync_options = SyncOptions {
        page_size: config.erp.page_size,
        page_delay: Duration::from_millis(config.erp.page_delay_ms),
    };
    let tasks = Arc::new(TaskDispatcher::new(
        conn.clone(),
        sync.clone(),
        sync_options,
        Arc::new(LoggingSender),
        events.clone(),
    ));

    let storage_root = resolve_path(&config.storage.root);
    tracing::info!("Document storage: {}", storage_root.display());

    let state = AppState {
        db: conn,
        config: config.clone(),
        events,
        sessions: InMemorySessionStore::shared(),
        storage: Arc::new(LocalFileStorage::new(
            storage_root,
            config.storage.max_upload_bytes,
        )),
        sync,
        tasks: tasks.clone(),
    };

    if config.scheduler.enabled {
        let worker = ScheduledSyncWorker::new(tasks, &config.scheduler.sync_cron)?;
        tokio::spawn(worker.run_loop());
    } else {
        tracing::info!("Scheduled sync is disabled");
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = routes::configure_routes(state)
        .layer(middleware::from_fn(system::middleware::request_logger))
        .layer(cors);

    let port = config.server.port;
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Error: Port {} is already in use. Please ensure no other process is using this port.",
                    port
                );
            } else {
                tracing::error!("Failed to bind to port {}. Error: {}", port, e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
