//! Session-scoped view state.
//!
//! One `SessionState` per signed-in user; writers bump the revision and
//! notify that user's watchers only.

use async_trait::async_trait;
use contracts::shared::session_state::SessionState;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session: &str) -> SessionState;

    /// Replace the state; returns the stored revision
    async fn set(&self, session: &str, state: SessionState) -> u64;

    async fn subscribe(&self, session: &str) -> watch::Receiver<SessionState>;

    /// Drop a session's state (on logout)
    async fn remove(&self, session: &str);

    /// Apply `f` to the current state and store the result
    async fn update(
        &self,
        session: &str,
        f: Box<dyn for<'a> FnOnce(&'a mut SessionState) + Send>,
    ) -> SessionState {
        let mut state = self.get(session).await;
        f(&mut state);
        self.set(session, state.clone()).await;
        self.get(session).await
    }
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, watch::Sender<SessionState>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<dyn SessionStore> {
        Arc::new(Self::new())
    }

    async fn sender(&self, session: &str) -> watch::Sender<SessionState> {
        if let Some(tx) = self.sessions.read().await.get(session) {
            return tx.clone();
        }
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session.to_string())
            .or_insert_with(|| watch::channel(SessionState::default()).0)
            .clone()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session: &str) -> SessionState {
        self.sender(session).await.borrow().clone()
    }

    async fn set(&self, session: &str, mut state: SessionState) -> u64 {
        let tx = self.sender(session).await;
        let mut revision = 0;
        tx.send_modify(|current| {
            state.revision = current.revision + 1;
            revision = state.revision;
            *current = state;
        });
        revision
    }

    async fn subscribe(&self, session: &str) -> watch::Receiver<SessionState> {
        self.sender(session).await.subscribe()
    }

    async fn remove(&self, session: &str) {
        self.sessions.write().await.remove(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = InMemorySessionStore::new();
        let mut state = store.get("alice").await;
        state.sync_in_progress = true;
        store.set("alice", state).await;

        assert!(store.get("alice").await.sync_in_progress);
        assert!(!store.get("bob").await.sync_in_progress);
    }

    #[tokio::test]
    async fn test_subscriber_sees_update() {
        let store = InMemorySessionStore::new();
        let mut rx = store.subscribe("alice").await;

        let updated = store
            .update(
                "alice",
                Box::new(|s| s.filters.search = Some("RO-12".into())),
            )
            .await;

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().filters.search.as_deref(), Some("RO-12"));
        assert_eq!(updated.revision, 1);
    }

    #[tokio::test]
    async fn test_remove_resets_state() {
        let store = InMemorySessionStore::new();
        store
            .update("alice", Box::new(|s| s.sync_in_progress = true))
            .await;
        store.remove("alice").await;

        let state = store.get("alice").await;
        assert!(!state.sync_in_progress);
        assert_eq!(state.revision, 0);
    }

    #[tokio::test]
    async fn test_update_through_shared_store() {
        let store = InMemorySessionStore::shared();
        let search = String::from("RO-44");

        let updated = store
            .update("carol", Box::new(move |s| s.filters.search = Some(search)))
            .await;
        assert_eq!(updated.filters.search.as_deref(), Some("RO-44"));
        assert_eq!(store.get("carol").await.filters.search.as_deref(), Some("RO-44"));
    }
}
