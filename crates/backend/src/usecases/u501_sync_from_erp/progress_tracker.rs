use contracts::usecases::u501_sync_from_erp::progress::{SyncProgress, SyncStatus};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory progress of bulk sync sessions
#[derive(Clone)]
pub struct ProgressTracker {
    sessions: Arc<RwLock<HashMap<String, SyncProgress>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    // A panicking writer leaves plain counters behind, still readable
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, SyncProgress>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, SyncProgress>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn create_session(&self, session_id: String) {
        self.write()
            .insert(session_id.clone(), SyncProgress::new(session_id));
    }

    pub fn get_progress(&self, session_id: &str) -> Option<SyncProgress> {
        self.read().get(session_id).cloned()
    }

    pub fn set_page(&self, session_id: &str, page: u32) {
        if let Some(p) = self.write().get_mut(session_id) {
            p.page = page;
            p.updated_at = chrono::Utc::now();
        }
    }

    pub fn update_progress(
        &self,
        session_id: &str,
        created: u32,
        updated: u32,
        failed: u32,
        current_item: Option<String>,
    ) {
        if let Some(p) = self.write().get_mut(session_id) {
            p.created = created;
            p.updated = updated;
            p.failed = failed;
            p.processed = created + updated + failed;
            p.current_item = current_item;
            p.updated_at = chrono::Utc::now();
        }
    }

    pub fn add_error(&self, session_id: &str, message: String) {
        if let Some(p) = self.write().get_mut(session_id) {
            p.error_messages.push(message);
            p.updated_at = chrono::Utc::now();
        }
    }

    pub fn complete_session(&self, session_id: &str, status: SyncStatus) {
        if let Some(p) = self.write().get_mut(session_id) {
            p.status = status;
            p.current_item = None;
            p.completed_at = Some(chrono::Utc::now());
            p.updated_at = chrono::Utc::now();
        }
    }

    pub fn cleanup_old_sessions(&self, max_age_hours: i64) {
        let now = chrono::Utc::now();
        self.write().retain(|_, p| match p.completed_at {
            Some(completed_at) => (now - completed_at).num_hours() < max_age_hours,
            None => true,
        });
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
