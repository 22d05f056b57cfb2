use super::dispatcher::TaskDispatcher;
use anyhow::Context;
use chrono::Utc;
use contracts::system::tasks::{TaskKind, TaskRun};
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;

/// Cron-driven trigger of the ERP bulk sync
pub struct ScheduledSyncWorker {
    dispatcher: Arc<TaskDispatcher>,
    schedule: Schedule,
}

impl ScheduledSyncWorker {
    /// `expression` is a six-field cron line, seconds first
    pub fn new(dispatcher: Arc<TaskDispatcher>, expression: &str) -> anyhow::Result<Self> {
        let schedule = Schedule::from_str(expression)
            .with_context(|| format!("Invalid sync cron expression '{}'", expression))?;
        Ok(Self {
            dispatcher,
            schedule,
        })
    }

    /// Start a bulk sync unless one is still running
    pub fn tick(&self) -> Option<TaskRun> {
        let run = self.dispatcher.try_trigger(TaskKind::ErpSyncAll);
        if run.is_none() {
            tracing::warn!("Scheduled ERP sync skipped: previous run still in progress");
        }
        run
    }

    pub async fn run_loop(self) {
        tracing::info!("Scheduled sync worker started");
        loop {
            let Some(next) = self.schedule.upcoming(Utc).next() else {
                tracing::warn!("Sync schedule has no upcoming time, worker stops");
                return;
            };
            let wait = (next - Utc::now()).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;
            if let Some(run) = self.tick() {
                tracing::info!("Scheduled ERP sync started as run {}", run.run_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::test_support::memory_db;
    use crate::shared::events::BroadcastPublisher;
    use crate::system::tasks::dispatcher::test_support::{dispatcher, StalledErp};

    #[tokio::test]
    async fn test_tick_skips_while_sync_runs() {
        let db = memory_db().await;
        let tasks = dispatcher(db, Arc::new(StalledErp), BroadcastPublisher::shared());
        let worker = ScheduledSyncWorker::new(tasks, "0 0 */4 * * *").unwrap();

        assert!(worker.tick().is_some());
        assert!(worker.tick().is_none());
    }

    #[tokio::test]
    async fn test_invalid_expression() {
        let db = memory_db().await;
        let tasks = dispatcher(db, Arc::new(StalledErp), BroadcastPublisher::shared());
        assert!(ScheduledSyncWorker::new(tasks, "every day").is_err());
    }
}
