use crate::shared::events::SharedPublisher;
use crate::system::auth::jwt::generate_random_token;
use crate::usecases::u501_sync_from_erp::{SyncExecutor, SyncOptions};
use crate::usecases::u503_dispatch_notifications::{dispatch_approved, NotificationSender};
use chrono::Utc;
use contracts::shared::events::AppEvent;
use contracts::system::tasks::{TaskKind, TaskRun, TaskRunInfo, TaskRunStatus};
use sea_orm::DatabaseConnection;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Finished ERP progress sessions older than this are dropped
const PROGRESS_RETENTION_HOURS: i64 = 24;

/// Finished runs older than this are dropped from the registry
const RUN_RETENTION_HOURS: i64 = 24;

struct RunEntry {
    info: TaskRunInfo,
    access_token: String,
}

impl RunEntry {
    fn is_running(&self, kind: TaskKind) -> bool {
        self.info.kind == kind && self.info.status == TaskRunStatus::Running
    }
}

fn register(runs: &mut HashMap<String, RunEntry>, kind: TaskKind) -> TaskRun {
    let run = TaskRun {
        run_id: Uuid::new_v4().to_string(),
        access_token: generate_random_token(),
    };
    runs.insert(
        run.run_id.clone(),
        RunEntry {
            info: TaskRunInfo {
                run_id: run.run_id.clone(),
                kind,
                status: TaskRunStatus::Running,
                started_at: Utc::now(),
                finished_at: None,
                message: None,
            },
            access_token: run.access_token.clone(),
        },
    );
    run
}

fn prune_finished(runs: &mut HashMap<String, RunEntry>) {
    let cutoff = Utc::now() - chrono::Duration::hours(RUN_RETENTION_HOURS);
    runs.retain(|_, entry| match entry.info.finished_at {
        Some(finished_at) => finished_at > cutoff,
        None => true,
    });
}

/// Starts background jobs and keeps a registry of their runs.
///
/// Each run gets a random access token; only holders of that token may
/// subscribe to the run's events.
pub struct TaskDispatcher {
    db: DatabaseConnection,
    sync: Arc<SyncExecutor>,
    sync_options: SyncOptions,
    sender: Arc<dyn NotificationSender>,
    events: SharedPublisher,
    runs: RwLock<HashMap<String, RunEntry>>,
}

impl TaskDispatcher {
    pub fn new(
        db: DatabaseConnection,
        sync: Arc<SyncExecutor>,
        sync_options: SyncOptions,
        sender: Arc<dyn NotificationSender>,
        events: SharedPublisher,
    ) -> Self {
        Self {
            db,
            sync,
            sync_options,
            sender,
            events,
            runs: RwLock::new(HashMap::new()),
        }
    }

    /// Spawn `kind` and return immediately
    pub fn trigger(self: &Arc<Self>, kind: TaskKind) -> TaskRun {
        let run = {
            let mut runs = self.runs.write().unwrap_or_else(|e| e.into_inner());
            prune_finished(&mut runs);
            register(&mut runs, kind)
        };
        self.spawn(kind, &run, self.sync_options);
        run
    }

    /// [`Self::trigger`] unless a run of `kind` is still in progress
    pub fn try_trigger(self: &Arc<Self>, kind: TaskKind) -> Option<TaskRun> {
        self.try_trigger_with(kind, self.sync_options)
    }

    /// [`Self::try_trigger`] with explicit paging for a bulk sync. The running
    /// check and the registration happen under one lock.
    pub fn try_trigger_with(
        self: &Arc<Self>,
        kind: TaskKind,
        sync_options: SyncOptions,
    ) -> Option<TaskRun> {
        let run = {
            let mut runs = self.runs.write().unwrap_or_else(|e| e.into_inner());
            prune_finished(&mut runs);
            if runs.values().any(|entry| entry.is_running(kind)) {
                return None;
            }
            register(&mut runs, kind)
        };
        self.spawn(kind, &run, sync_options);
        Some(run)
    }

    fn spawn(self: &Arc<Self>, kind: TaskKind, run: &TaskRun, sync_options: SyncOptions) {
        tracing::info!("Task {} started as run {}", kind.as_str(), run.run_id);

        let this = Arc::clone(self);
        let run_id = run.run_id.clone();
        tokio::spawn(async move {
            let (success, message) = this.execute(kind, &run_id, sync_options).await;
            this.finish(&run_id, success, message);
        });
    }

    async fn execute(
        &self,
        kind: TaskKind,
        run_id: &str,
        sync_options: SyncOptions,
    ) -> (bool, Option<String>) {
        match kind {
            TaskKind::ErpSyncAll => {
                let tracker = &self.sync.progress_tracker;
                tracker.cleanup_old_sessions(PROGRESS_RETENTION_HOURS);
                tracker.create_session(run_id.to_string());
                let summary = self.sync.sync_all(run_id, sync_options).await;
                match summary.aborted {
                    Some(reason) => (false, Some(reason)),
                    None => (
                        true,
                        Some(format!(
                            "created {}, updated {}, failed {}",
                            summary.created, summary.updated, summary.failed
                        )),
                    ),
                }
            }
            TaskKind::DispatchNotifications => {
                match dispatch_approved(&self.db, self.sender.as_ref(), &self.events).await {
                    Ok(summary) => (
                        true,
                        Some(format!("sent {}, failed {}", summary.sent, summary.failed)),
                    ),
                    Err(e) => (false, Some(e.user_message())),
                }
            }
        }
    }

    fn finish(&self, run_id: &str, success: bool, message: Option<String>) {
        if let Some(entry) = self
            .runs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(run_id)
        {
            entry.info.status = if success {
                TaskRunStatus::Completed
            } else {
                TaskRunStatus::Failed
            };
            entry.info.finished_at = Some(Utc::now());
            entry.info.message = message.clone();
        }
        if success {
            tracing::info!("Run {} completed: {:?}", run_id, message);
        } else {
            tracing::error!("Run {} failed: {:?}", run_id, message);
        }
        self.events.publish(AppEvent::TaskFinished {
            run_id: run_id.to_string(),
            success,
            message,
        });
    }

    pub fn get_run(&self, run_id: &str) -> Option<TaskRunInfo> {
        self.runs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(run_id)
            .map(|entry| entry.info.clone())
    }

    /// True when `token` was issued for `run_id`
    pub fn authorize(&self, run_id: &str, token: &str) -> bool {
        self.runs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(run_id)
            .map(|entry| entry.access_token == token)
            .unwrap_or(false)
    }

    pub fn is_running(&self, kind: TaskKind) -> bool {
        self.runs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .any(|entry| entry.is_running(kind))
    }

    pub fn default_sync_options(&self) -> SyncOptions {
        self.sync_options
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<AppEvent> {
        self.events.subscribe()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{dispatcher, StalledErp};
    use super::*;
    use crate::shared::data::db::test_support::memory_db;
    use crate::shared::events::BroadcastPublisher;

    #[tokio::test]
    async fn test_dispatch_run_finishes_and_reports() {
        let db = memory_db().await;
        let events = BroadcastPublisher::shared();
        let mut rx = events.subscribe();
        let tasks = dispatcher(db, Arc::new(StalledErp), events);

        let run = tasks.trigger(TaskKind::DispatchNotifications);
        assert!(tasks.authorize(&run.run_id, &run.access_token));
        assert!(!tasks.authorize(&run.run_id, "guess"));

        let event = loop {
            let e = rx.recv().await.unwrap();
            if e.run_id() == Some(run.run_id.as_str()) {
                break e;
            }
        };
        assert_eq!(
            event,
            AppEvent::TaskFinished {
                run_id: run.run_id.clone(),
                success: true,
                message: Some("sent 0, failed 0".into()),
            }
        );
        let info = tasks.get_run(&run.run_id).unwrap();
        assert_eq!(info.status, TaskRunStatus::Completed);
        assert!(info.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_sync_run_stays_running_while_erp_stalls() {
        let db = memory_db().await;
        let tasks = dispatcher(db, Arc::new(StalledErp), BroadcastPublisher::shared());

        let run = tasks.trigger(TaskKind::ErpSyncAll);
        tokio::task::yield_now().await;

        assert!(tasks.is_running(TaskKind::ErpSyncAll));
        assert!(!tasks.is_running(TaskKind::DispatchNotifications));
        assert_eq!(tasks.get_run(&run.run_id).unwrap().status, TaskRunStatus::Running);
        assert!(!tasks.authorize("missing", &run.access_token));
    }

    #[tokio::test]
    async fn test_try_trigger_refuses_second_sync() {
        let db = memory_db().await;
        let tasks = dispatcher(db, Arc::new(StalledErp), BroadcastPublisher::shared());

        let first = tasks.try_trigger(TaskKind::ErpSyncAll);
        assert!(first.is_some());
        assert!(tasks.try_trigger(TaskKind::ErpSyncAll).is_none());
        assert!(tasks.try_trigger(TaskKind::DispatchNotifications).is_some());
    }

    #[tokio::test]
    async fn test_old_finished_runs_are_pruned() {
        let db = memory_db().await;
        let tasks = dispatcher(db, Arc::new(StalledErp), BroadcastPublisher::shared());
        let long_ago = Utc::now() - chrono::Duration::hours(RUN_RETENTION_HOURS + 1);

        {
            let mut runs = tasks.runs.write().unwrap();
            let stale = register(&mut runs, TaskKind::DispatchNotifications);
            let entry = runs.get_mut(&stale.run_id).unwrap();
            entry.info.status = TaskRunStatus::Completed;
            entry.info.started_at = long_ago;
            entry.info.finished_at = Some(long_ago);

            let stuck = register(&mut runs, TaskKind::DispatchNotifications);
            runs.get_mut(&stuck.run_id).unwrap().info.started_at = long_ago;
        }
        assert_eq!(tasks.runs.read().unwrap().len(), 2);

        let fresh = tasks.trigger(TaskKind::DispatchNotifications);

        let runs = tasks.runs.read().unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs.contains_key(&fresh.run_id));
        assert!(runs.values().all(|e| e.info.finished_at.is_none() || e.info.run_id == fresh.run_id));
    }
}
