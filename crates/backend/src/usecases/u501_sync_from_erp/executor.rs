use super::erp_api_client::{is_terminal_page, ErpSource};
use super::mapping;
use super::progress_tracker::ProgressTracker;
use crate::domain::a001_repair_order::service as orders;
use crate::shared::error::AppResult;
use crate::shared::events::SharedPublisher;
use contracts::shared::events::AppEvent;
use contracts::usecases::u501_sync_from_erp::progress::{SyncProgress, SyncStatus};
use contracts::usecases::u501_sync_from_erp::response::{
    SyncAction, SyncAllSummary, SyncFailure, SyncOneResult,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const SYNC_ACTOR: &str = "erp-sync";

/// Paging parameters of a bulk run
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub page_size: u32,
    pub page_delay: Duration,
}

/// Executor of the ERP -> local reconciliation
pub struct SyncExecutor {
    db: DatabaseConnection,
    erp: Arc<dyn ErpSource>,
    events: SharedPublisher,
    pub progress_tracker: Arc<ProgressTracker>,
}

impl SyncExecutor {
    pub fn new(
        db: DatabaseConnection,
        erp: Arc<dyn ErpSource>,
        events: SharedPublisher,
        progress_tracker: Arc<ProgressTracker>,
    ) -> Self {
        Self {
            db,
            erp,
            events,
            progress_tracker,
        }
    }

    /// Reconcile one ERP order with the local store.
    ///
    /// `revalidate` publishes `OrdersChanged` after the write; bulk runs pass
    /// `false` and publish once at the end.
    pub async fn sync_one(&self, external_id: &str, revalidate: bool) -> AppResult<SyncOneResult> {
        let details = self.erp.fetch_details(external_id).await?;

        let result = match orders::find_by_external_id(&self.db, &details.id).await? {
            None => {
                let order = mapping::new_order(&details);
                orders::insert_new(&self.db, &order, SYNC_ACTOR).await?;
                tracing::info!("ERP sync: created {} from {}", order.ro_number(), external_id);
                SyncOneResult {
                    action: SyncAction::Create,
                    local_id: order.to_string_id(),
                }
            }
            Some(mut order) => {
                let changes = mapping::apply_details(&mut order, &details);
                orders::persist_changes(&self.db, &mut order, &changes, SYNC_ACTOR).await?;
                if !changes.is_empty() {
                    tracing::info!(
                        "ERP sync: updated {} ({} field(s))",
                        order.ro_number(),
                        changes.len()
                    );
                }
                SyncOneResult {
                    action: SyncAction::Update,
                    local_id: order.to_string_id(),
                }
            }
        };

        if revalidate {
            self.events.publish(AppEvent::OrdersChanged);
        }
        Ok(result)
    }

    /// Page through the ERP list and reconcile every item.
    ///
    /// An item failure is tallied and the loop continues. A page fetch
    /// failure stops the run; counts gathered so far are kept and the error
    /// goes to `aborted`.
    pub async fn sync_all(&self, session_id: &str, options: SyncOptions) -> SyncAllSummary {
        let mut summary = SyncAllSummary::default();
        let mut page = 1u32;

        tracing::info!(
            "ERP bulk sync {} started (page size {}, delay {:?})",
            session_id,
            options.page_size,
            options.page_delay
        );

        loop {
            self.progress_tracker.set_page(session_id, page);

            let items = match self.erp.fetch_list(options.page_size, page).await {
                Ok(items) => items,
                Err(e) => {
                    let msg = format!("Page {} fetch failed: {}", page, e);
                    tracing::error!("ERP bulk sync {}: {}", session_id, msg);
                    self.progress_tracker.add_error(session_id, msg.clone());
                    summary.aborted = Some(msg);
                    break;
                }
            };
            summary.pages += 1;
            let item_count = items.len();

            for item in items {
                self.progress_tracker.update_progress(
                    session_id,
                    summary.created,
                    summary.updated,
                    summary.failed,
                    Some(item.order_no.clone()),
                );

                match self.sync_one(&item.id, false).await {
                    Ok(result) => match result.action {
                        SyncAction::Create => summary.created += 1,
                        SyncAction::Update => summary.updated += 1,
                    },
                    Err(e) => {
                        let message = e.to_string();
                        tracing::warn!("ERP sync of {} failed: {}", item.id, message);
                        self.progress_tracker.add_error(
                            session_id,
                            format!("{}: {}", item.order_no, message),
                        );
                        summary.failed += 1;
                        summary.failures.push(SyncFailure {
                            external_id: item.id.clone(),
                            message,
                        });
                    }
                }

                self.events.publish(AppEvent::SyncProgress {
                    run_id: session_id.to_string(),
                    processed: summary.processed(),
                    created: summary.created,
                    updated: summary.updated,
                    failed: summary.failed,
                });
            }

            if is_terminal_page(item_count, options.page_size) {
                break;
            }
            page += 1;
            if !options.page_delay.is_zero() {
                tokio::time::sleep(options.page_delay).await;
            }
        }

        self.progress_tracker.update_progress(
            session_id,
            summary.created,
            summary.updated,
            summary.failed,
            None,
        );
        let status = if summary.aborted.is_some() {
            SyncStatus::Failed
        } else if summary.failed > 0 {
            SyncStatus::CompletedWithErrors
        } else {
            SyncStatus::Completed
        };
        self.progress_tracker.complete_session(session_id, status);

        if summary.processed() > 0 {
            self.events.publish(AppEvent::OrdersChanged);
        }
        self.events.publish(AppEvent::SyncFinished {
            run_id: session_id.to_string(),
            summary: summary.clone(),
        });

        tracing::info!(
            "ERP bulk sync {} finished: pages={}, created={}, updated={}, failed={}",
            session_id,
            summary.pages,
            summary.created,
            summary.updated,
            summary.failed
        );
        summary
    }

    /// Register a new session id for a bulk run
    pub fn create_session(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        self.progress_tracker.create_session(session_id.clone());
        session_id
    }

    pub fn get_progress(&self, session_id: &str) -> Option<SyncProgress> {
        self.progress_tracker.get_progress(session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a003_activity_log::service as activity;
    use crate::shared::data::db::test_support::memory_db;
    use crate::shared::error::AppError;
    use crate::shared::events::{BroadcastPublisher, EventPublisher};
    use crate::usecases::u501_sync_from_erp::erp_models::{
        ErpOrderDetails, ErpOrderSummary, ErpPart, ErpStatus, ErpVendor,
    };
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Scripted ERP: `total` orders served in pages, optional failing ids
    struct FakeErp {
        total: usize,
        failing: HashSet<String>,
        broken_page: Option<u32>,
        statuses: Mutex<HashMap<String, String>>,
        requested_pages: Mutex<Vec<u32>>,
        detail_calls: Mutex<Vec<String>>,
    }

    impl FakeErp {
        fn new(total: usize) -> Self {
            Self {
                total,
                failing: HashSet::new(),
                broken_page: None,
                statuses: Mutex::new(HashMap::new()),
                requested_pages: Mutex::new(Vec::new()),
                detail_calls: Mutex::new(Vec::new()),
            }
        }

        fn id(i: usize) -> String {
            format!("ext-{i}")
        }

        fn pages(&self) -> Vec<u32> {
            self.requested_pages.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ErpSource for FakeErp {
        async fn fetch_list(&self, page_size: u32, page: u32) -> AppResult<Vec<ErpOrderSummary>> {
            self.requested_pages.lock().unwrap().push(page);
            if self.broken_page == Some(page) {
                return Err(AppError::Api("HTTP 500".into()));
            }
            let start = (page as usize - 1) * page_size as usize;
            let end = (start + page_size as usize).min(self.total);
            Ok((start.min(end)..end)
                .map(|i| ErpOrderSummary {
                    id: Self::id(i + 1),
                    order_no: format!("RO-{}", i + 1),
                    status: ErpStatus {
                        code: "IW".into(),
                        name: "IN WORK".into(),
                    },
                    created_at: None,
                    updated_at: None,
                })
                .collect())
        }

        async fn fetch_details(&self, external_id: &str) -> AppResult<ErpOrderDetails> {
            self.detail_calls.lock().unwrap().push(external_id.to_string());
            if self.failing.contains(external_id) {
                return Err(AppError::Api(format!("order {external_id} unavailable")));
            }
            let n = external_id.trim_start_matches("ext-");
            let status = self
                .statuses
                .lock()
                .unwrap()
                .get(external_id)
                .cloned()
                .unwrap_or_else(|| "IN WORK".into());
            Ok(ErpOrderDetails {
                id: external_id.to_string(),
                order_no: format!("RO-{n}"),
                status: ErpStatus {
                    code: "X".into(),
                    name: status,
                },
                vendor: Some(ErpVendor {
                    id: "V-1".into(),
                    name: "Acme Repair".into(),
                }),
                created_at: None,
                updated_at: None,
                next_update_due: Some("2024-05-01".into()),
                parts: vec![ErpPart {
                    part_number: "HP-220".into(),
                    description: "Hydraulic pump".into(),
                    quantity: 1.0,
                    unit_price: Some(100.0),
                    serials: vec!["SN-1".into()],
                    tags: vec![],
                }],
            })
        }
    }

    fn options(page_size: u32) -> SyncOptions {
        SyncOptions {
            page_size,
            page_delay: Duration::ZERO,
        }
    }

    async fn executor(erp: Arc<FakeErp>) -> (SyncExecutor, Arc<BroadcastPublisher>) {
        let db = memory_db().await;
        let publisher = Arc::new(BroadcastPublisher::new());
        let exec = SyncExecutor::new(
            db,
            erp,
            publisher.clone(),
            Arc::new(ProgressTracker::new()),
        );
        (exec, publisher)
    }

    #[tokio::test]
    async fn test_sync_one_is_idempotent() {
        let erp = Arc::new(FakeErp::new(1));
        let (exec, _) = executor(erp).await;

        let first = exec.sync_one("ext-1", false).await.unwrap();
        assert_eq!(first.action, SyncAction::Create);
        let order = orders::find_by_external_id(&exec.db, "ext-1").await.unwrap().unwrap();
        let activity_before = activity::count_activity(&exec.db, &order.base.id).await.unwrap();

        let second = exec.sync_one("ext-1", false).await.unwrap();
        assert_eq!(second.action, SyncAction::Update);
        assert_eq!(second.local_id, first.local_id);

        let after = orders::find_by_external_id(&exec.db, "ext-1").await.unwrap().unwrap();
        assert_eq!(after.base.metadata.version, order.base.metadata.version);
        assert_eq!(
            activity::count_activity(&exec.db, &order.base.id).await.unwrap(),
            activity_before
        );
    }

    #[tokio::test]
    async fn test_sync_one_records_status_change() {
        let erp = Arc::new(FakeErp::new(1));
        let (exec, _) = executor(erp.clone()).await;
        exec.sync_one("ext-1", false).await.unwrap();

        erp.statuses
            .lock()
            .unwrap()
            .insert("ext-1".into(), "SHIPPED".into());
        exec.sync_one("ext-1", false).await.unwrap();

        let order = orders::find_by_external_id(&exec.db, "ext-1").await.unwrap().unwrap();
        assert_eq!(order.current_status, "SHIPPED");
        let history = activity::list_status_history(&exec.db, &order.base.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].new_status, "SHIPPED");
        assert_eq!(history[0].actor, SYNC_ACTOR);
    }

    #[tokio::test]
    async fn test_revalidate_publishes_orders_changed() {
        let erp = Arc::new(FakeErp::new(1));
        let (exec, publisher) = executor(erp).await;
        let mut rx = publisher.subscribe();

        exec.sync_one("ext-1", false).await.unwrap();
        assert!(rx.try_recv().is_err());

        exec.sync_one("ext-1", true).await.unwrap();
        assert_eq!(rx.try_recv().unwrap(), AppEvent::OrdersChanged);
    }

    #[tokio::test]
    async fn test_failing_item_does_not_abort_batch() {
        let mut fake = FakeErp::new(5);
        fake.failing.insert("ext-3".into());
        let erp = Arc::new(fake);
        let (exec, _) = executor(erp.clone()).await;

        let session = exec.create_session();
        let summary = exec.sync_all(&session, options(50)).await;

        assert_eq!(summary.succeeded(), 4);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].external_id, "ext-3");
        assert!(summary.aborted.is_none());
        let calls = erp.detail_calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["ext-1", "ext-2", "ext-3", "ext-4", "ext-5"]);

        let progress = exec.get_progress(&session).unwrap();
        assert_eq!(progress.status, SyncStatus::CompletedWithErrors);
        assert_eq!(progress.processed, 5);
    }

    #[tokio::test]
    async fn test_full_page_requests_next_page() {
        let erp = Arc::new(FakeErp::new(50));
        let (exec, _) = executor(erp.clone()).await;

        let session = exec.create_session();
        let summary = exec.sync_all(&session, options(50)).await;

        // page 2 comes back empty and ends the run
        assert_eq!(erp.pages(), vec![1, 2]);
        assert_eq!(summary.created, 50);
        assert_eq!(summary.pages, 2);
    }

    #[tokio::test]
    async fn test_short_page_terminates() {
        let erp = Arc::new(FakeErp::new(30));
        let (exec, _) = executor(erp.clone()).await;

        let session = exec.create_session();
        let summary = exec.sync_all(&session, options(50)).await;

        assert_eq!(erp.pages(), vec![1]);
        assert_eq!(summary.created, 30);
    }

    #[tokio::test]
    async fn test_page_failure_aborts_and_keeps_counts() {
        let mut fake = FakeErp::new(8);
        fake.broken_page = Some(2);
        let erp = Arc::new(fake);
        let (exec, _) = executor(erp.clone()).await;

        let session = exec.create_session();
        let summary = exec.sync_all(&session, options(5)).await;

        assert_eq!(summary.created, 5);
        assert!(summary.aborted.as_deref().unwrap().contains("Page 2"));
        assert_eq!(erp.pages(), vec![1, 2]);
        assert_eq!(exec.get_progress(&session).unwrap().status, SyncStatus::Failed);
    }

    #[tokio::test]
    async fn test_rerun_updates_instead_of_creating() {
        let erp = Arc::new(FakeErp::new(3));
        let (exec, _) = executor(erp).await;

        let first = exec.sync_all(&exec.create_session(), options(50)).await;
        let second = exec.sync_all(&exec.create_session(), options(50)).await;

        assert_eq!(first.created, 3);
        assert_eq!(second.created, 0);
        assert_eq!(second.updated, 3);
        assert_eq!(orders::count_all(&exec.db).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_bulk_run_publishes_progress_and_finish() {
        let erp = Arc::new(FakeErp::new(2));
        let (exec, publisher) = executor(erp).await;
        let mut rx = publisher.subscribe();

        let session = exec.create_session();
        exec.sync_all(&session, options(50)).await;

        let mut names = Vec::new();
        while let Ok(event) = rx.try_recv() {
            names.push(event.name());
        }
        assert_eq!(
            names,
            vec!["sync_progress", "sync_progress", "orders_changed", "sync_finished"]
        );
    }
}
