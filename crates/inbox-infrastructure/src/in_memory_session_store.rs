//! Process-local persona session store.
//!
//! Sessions are lost on restart; durable stores implement the same trait.

use async_trait::async_trait;
use inbox_core::error::Result;
use inbox_core::persona::{PersonaSessionStore, PersonaState};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory `PersonaSessionStore` keyed by session id.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, PersonaState>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl PersonaSessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<PersonaState>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned())
    }

    async fn put(&self, state: PersonaState) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(state.session_id.clone(), state);
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<bool> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.remove(session_id).is_some())
    }

    async fn list_ids(&self) -> Result<Vec<String>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = InMemorySessionStore::new();
        let state = PersonaState::new("u1", Utc::now());
        let id = state.session_id.clone();

        store.put(state.clone()).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap(), Some(state));
        assert_eq!(store.list_ids().await.unwrap(), vec![id.clone()]);

        assert!(store.delete(&id).await.unwrap());
        assert!(!store.delete(&id).await.unwrap());
        assert!(store.get(&id).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_put_replaces_existing() {
        let store = InMemorySessionStore::new();
        let mut state = PersonaState::new("u1", Utc::now());
        store.put(state.clone()).await.unwrap();

        state.version = 7;
        store.put(state.clone()).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(&state.session_id).await.unwrap().unwrap().version, 7);
    }
}
