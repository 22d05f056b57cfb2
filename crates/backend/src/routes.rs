use axum::extract::DefaultBodyLimit;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::api::handlers;
use crate::system;
use crate::AppState;

/// Multipart framing on top of the file itself
const UPLOAD_OVERHEAD_BYTES: u64 = 64 * 1024;

/// All application routes
pub fn configure_routes(state: AppState) -> Router {
    let upload_limit = (state.config.storage.max_upload_bytes + UPLOAD_OVERHEAD_BYTES) as usize;

    // ========================================
    // PUBLIC
    // ========================================
    let public = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/system/auth/login", post(system::handlers::auth::login))
        .route("/api/system/auth/refresh", post(system::handlers::auth::refresh))
        .route("/api/system/auth/logout", post(system::handlers::auth::logout))
        // Authorized by the run-scoped token in the query
        .route("/api/tasks/:run_id/events", get(handlers::tasks::events));

    // ========================================
    // SIGNED-IN USERS
    // ========================================
    let protected = Router::new()
        .route("/api/system/auth/me", get(system::handlers::auth::current_user))
        .route("/api/session/state", get(handlers::session::get_state))
        .route("/api/session/filters", put(handlers::session::set_filters))
        // A001 Repair orders
        .route(
            "/api/a001/repair-orders",
            get(handlers::a001_repair_order::list_paginated)
                .post(handlers::a001_repair_order::create),
        )
        .route(
            "/api/a001/repair-orders/:id",
            get(handlers::a001_repair_order::get_by_id)
                .put(handlers::a001_repair_order::update)
                .delete(handlers::a001_repair_order::archive),
        )
        .route(
            "/api/a001/repair-orders/:id/activity",
            get(handlers::a001_repair_order::activity),
        )
        .route(
            "/api/a001/repair-orders/:id/status-history",
            get(handlers::a001_repair_order::status_history),
        )
        .route(
            "/api/a001/repair-orders/:id/relations",
            get(handlers::a004_order_relation::list_for_order)
                .post(handlers::a004_order_relation::link),
        )
        .route(
            "/api/a001/repair-orders/:id/documents",
            get(handlers::a001_repair_order::list_documents)
                .post(handlers::a001_repair_order::upload_documents)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        // A002 Notification queue
        .route(
            "/api/a002/notifications",
            get(handlers::a002_notification_queue::list)
                .post(handlers::a002_notification_queue::enqueue),
        )
        .route(
            "/api/a002/notifications/:id",
            get(handlers::a002_notification_queue::get_by_id),
        )
        .route(
            "/api/a002/notifications/:id/transition",
            post(handlers::a002_notification_queue::transition),
        )
        // A004 Order relations
        .route(
            "/api/a004/relations/:id",
            delete(handlers::a004_order_relation::unlink),
        )
        // U501 Sync from ERP
        .route("/api/u501/sync-all", post(handlers::usecases::u501_sync_all))
        // `:id` is the ERP order id for POST and the run id for progress
        .route("/api/u501/sync/:id", post(handlers::usecases::u501_sync_one))
        .route(
            "/api/u501/sync/:id/progress",
            get(handlers::usecases::u501_get_progress),
        )
        // U502 Spreadsheet sync
        .route("/api/u502/import", post(handlers::usecases::u502_import))
        .route("/api/u502/export", get(handlers::usecases::u502_export))
        // U503 Dispatch notifications
        .route("/api/u503/dispatch", post(handlers::usecases::u503_dispatch))
        // Background runs
        .route("/api/tasks/:run_id", get(handlers::tasks::get_run))
        // D400 Order stats
        .route("/api/d400/stats", get(handlers::d400_order_stats::get_stats))
        .route("/api/diagnostics", get(handlers::d400_order_stats::diagnostics))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            system::auth::require_auth,
        ));

    // ========================================
    // ADMIN
    // ========================================
    let admin = Router::new()
        .route(
            "/api/system/users",
            get(system::handlers::users::list).post(system::handlers::users::create),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            system::auth::require_admin,
        ));

    public.merge(protected).merge(admin).with_state(state)
}
