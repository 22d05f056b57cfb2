pub mod api;
pub mod dashboards;
pub mod domain;
pub mod routes;
pub mod shared;
pub mod system;
pub mod usecases;

use sea_orm::DatabaseConnection;
use shared::config::Config;
use shared::events::SharedPublisher;
use shared::session_store::SessionStore;
use shared::storage::FileStorage;
use std::sync::Arc;
use system::tasks::TaskDispatcher;
use usecases::u501_sync_from_erp::SyncExecutor;

/// Handles shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub events: SharedPublisher,
    pub sessions: Arc<dyn SessionStore>,
    pub storage: Arc<dyn FileStorage>,
    pub sync: Arc<SyncExecutor>,
    pub tasks: Arc<TaskDispatcher>,
}
