use super::locks::SessionLocks;
use chrono::{DateTime, Utc};
use inbox_core::config::SessionConfig;
use inbox_core::conversation::ConversationMessage;
use inbox_core::error::Result;
use inbox_core::persona::{
    Checkpoint, ConfidenceScores, PersonaParameters, PersonaSessionStore, PersonaState,
    SessionStats,
};
use std::sync::Arc;

/// Drives persona interview sessions through their lifecycle.
///
/// `PersonaSessionManager` is responsible for:
/// - Creating sessions and merging per-turn updates
/// - Recording checkpoints on parameter-count boundaries
/// - Restoring sessions and expiring inactive ones
/// - Completing sessions
/// - Sweeping expired sessions
///
/// An unknown session id is a normal outcome (`Ok(None)` / `Ok(false)`),
/// never an error. `Err` only reports store failures.
pub struct PersonaSessionManager {
    store: Arc<dyn PersonaSessionStore>,
    locks: SessionLocks,
    config: SessionConfig,
}

impl PersonaSessionManager {
    /// Creates a new `PersonaSessionManager` over a store backend.
    ///
    /// # Arguments
    ///
    /// * `store` - Where session state is kept
    /// * `config` - Timeout, checkpoint interval and retention settings
    pub fn new(store: Arc<dyn PersonaSessionStore>, config: SessionConfig) -> Self {
        Self {
            store,
            locks: SessionLocks::new(),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Starts a new interview for `user_id`.
    ///
    /// The id is `persona_{user_id}_{unix_millis}`; if that id is taken the
    /// timestamp is advanced a millisecond at a time.
    pub async fn create_session(&self, user_id: &str) -> Result<PersonaState> {
        let mut created_at = Utc::now();
        loop {
            let session_id = PersonaState::session_id_for(user_id, created_at);
            let guard = self.locks.acquire(&session_id).await;
            if self.store.get(&session_id).await?.is_some() {
                drop(guard);
                created_at += chrono::Duration::milliseconds(1);
                continue;
            }

            let state = PersonaState::new(user_id, created_at);
            self.store.put(state.clone()).await?;
            tracing::info!(
                session_id = %state.session_id,
                "[PersonaSession] Created session for user {}",
                user_id
            );
            return Ok(state);
        }
    }

    /// Returns the stored state without applying the expiry rule.
    pub async fn get_session(&self, session_id: &str) -> Result<Option<PersonaState>> {
        self.store.get(session_id).await
    }

    /// Merges one interview turn into a session.
    ///
    /// Parameters and confidence are shallow-merged, `messages` replaces the
    /// history and the version is bumped. A checkpoint is recorded when the
    /// parameter count lands on a multiple of the checkpoint interval.
    ///
    /// # Returns
    ///
    /// The updated state, or `None` if the session does not exist.
    pub async fn update_session(
        &self,
        session_id: &str,
        parameters: PersonaParameters,
        confidence: ConfidenceScores,
        messages: Vec<ConversationMessage>,
    ) -> Result<Option<PersonaState>> {
        let guard = self.locks.acquire(session_id).await;
        let Some(mut state) = self.store.get(session_id).await? else {
            drop(guard);
            self.locks.release(session_id).await;
            tracing::warn!("[PersonaSession] Update for unknown session: {}", session_id);
            return Ok(None);
        };

        state.apply_update(parameters, confidence, messages);
        if state.is_checkpoint_due(self.config.checkpoint_interval) {
            self.record_checkpoint(&mut state, Utc::now());
        }
        self.store.put(state.clone()).await?;

        tracing::debug!(
            session_id = %session_id,
            version = state.version,
            "[PersonaSession] Updated session ({} parameters)",
            state.parameter_count()
        );
        Ok(Some(state))
    }

    /// Records a checkpoint for a session on demand.
    ///
    /// # Returns
    ///
    /// The new checkpoint, or `None` if the session does not exist.
    pub async fn save_checkpoint(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        let guard = self.locks.acquire(session_id).await;
        let Some(mut state) = self.store.get(session_id).await? else {
            drop(guard);
            self.locks.release(session_id).await;
            tracing::warn!("[PersonaSession] Checkpoint for unknown session: {}", session_id);
            return Ok(None);
        };

        let checkpoint = self.record_checkpoint(&mut state, Utc::now());
        self.store.put(state).await?;
        Ok(Some(checkpoint))
    }

    /// Looks a session up for resumption, expiring it if inactive.
    ///
    /// Last activity is the newest checkpoint. A session with no checkpoint
    /// yet counts as already past the timeout and is removed here.
    ///
    /// # Returns
    ///
    /// The unchanged state, or `None` if the session is unknown or expired.
    pub async fn restore_session(&self, session_id: &str) -> Result<Option<PersonaState>> {
        let guard = self.locks.acquire(session_id).await;
        let Some(state) = self.store.get(session_id).await? else {
            drop(guard);
            self.locks.release(session_id).await;
            tracing::info!("[PersonaSession] Nothing to restore for {}", session_id);
            return Ok(None);
        };

        if state.is_expired(Utc::now(), self.config.timeout()) {
            self.store.delete(session_id).await?;
            drop(guard);
            self.locks.release(session_id).await;
            tracing::info!(session_id = %session_id, "[PersonaSession] Session expired");
            return Ok(None);
        }

        tracing::info!(
            session_id = %session_id,
            "[PersonaSession] Restored session at version {}",
            state.version
        );
        Ok(Some(state))
    }

    /// Marks a session completed and records a final checkpoint.
    ///
    /// # Returns
    ///
    /// `true` if the session existed.
    pub async fn complete_session(&self, session_id: &str) -> Result<bool> {
        let guard = self.locks.acquire(session_id).await;
        let Some(mut state) = self.store.get(session_id).await? else {
            drop(guard);
            self.locks.release(session_id).await;
            tracing::warn!("[PersonaSession] Cannot complete unknown session: {}", session_id);
            return Ok(false);
        };

        state.complete(Utc::now(), self.config.max_checkpoints);
        self.store.put(state).await?;
        tracing::info!(session_id = %session_id, "[PersonaSession] Session completed");
        Ok(true)
    }

    /// Deletes every session whose last activity is past the timeout.
    ///
    /// Each check-and-delete holds that session's lock, so a concurrent
    /// update either lands before the check or sees the session gone.
    ///
    /// # Returns
    ///
    /// The number of sessions removed.
    pub async fn cleanup(&self) -> Result<usize> {
        let now = Utc::now();
        let timeout = self.config.timeout();
        let mut removed = 0;

        for session_id in self.store.list_ids().await? {
            let guard = self.locks.acquire(&session_id).await;
            let (present, expired) = match self.store.get(&session_id).await? {
                Some(state) => (true, state.is_expired(now, timeout)),
                None => (false, false),
            };
            if expired && self.store.delete(&session_id).await? {
                removed += 1;
                tracing::debug!(session_id = %session_id, "[PersonaSession] Swept expired session");
            }
            drop(guard);
            // deleted concurrently or swept here; either way no state is left to guard
            if expired || !present {
                self.locks.release(&session_id).await;
            }
        }

        tracing::info!(removed, "[PersonaSession] Cleanup removed {} expired sessions", removed);
        Ok(removed)
    }

    /// Progress summary for a session.
    pub async fn session_stats(&self, session_id: &str) -> Result<Option<SessionStats>> {
        let stats = self.store.get(session_id).await?.map(|state| state.stats());
        if stats.is_none() {
            tracing::warn!("[PersonaSession] Stats requested for unknown session: {}", session_id);
        }
        Ok(stats)
    }

    fn record_checkpoint(&self, state: &mut PersonaState, now: DateTime<Utc>) -> Checkpoint {
        let checkpoint = state
            .record_checkpoint(now, self.config.max_checkpoints)
            .clone();
        tracing::info!(
            session_id = %state.session_id,
            stage = %checkpoint.stage,
            "[PersonaSession] Checkpoint saved ({} kept)",
            state.checkpoints.len()
        );
        checkpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inbox_core::persona::{ParamValue, Phase, Stage};
    use inbox_infrastructure::InMemorySessionStore;

    fn manager() -> (PersonaSessionManager, Arc<InMemorySessionStore>) {
        let store = Arc::new(InMemorySessionStore::new());
        let manager = PersonaSessionManager::new(store.clone(), SessionConfig::default());
        (manager, store)
    }

    fn turn(name: &str, value: &str) -> (PersonaParameters, ConfidenceScores) {
        (
            PersonaParameters::from([(name.to_string(), ParamValue::from(value))]),
            ConfidenceScores::from([(name.to_string(), 0.5)]),
        )
    }

    #[tokio::test]
    async fn test_create_then_stats() {
        let (manager, _) = manager();
        let state = manager.create_session("u1").await.unwrap();
        assert!(state.session_id.starts_with("persona_u1_"));

        let stats = manager.session_stats(&state.session_id).await.unwrap().unwrap();
        assert_eq!(stats.parameter_count, 0);
        assert_eq!(stats.stage, Stage::Introduction);
        assert_eq!(stats.checkpoint_count, 0);
    }

    #[tokio::test]
    async fn test_create_avoids_id_collisions() {
        let (manager, store) = manager();
        let a = manager.create_session("u1").await.unwrap();
        let b = manager.create_session("u1").await.unwrap();
        assert_ne!(a.session_id, b.session_id);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_checkpoint_per_interval_crossing() {
        let (manager, _) = manager();
        let id = manager.create_session("u1").await.unwrap().session_id;

        let mut counts = Vec::new();
        for name in ["tone", "boundaries", "fallback_reply", "allowed_topics", "response_length"] {
            let (p, c) = turn(name, "value");
            let state = manager.update_session(&id, p, c, Vec::new()).await.unwrap().unwrap();
            counts.push(state.checkpoints.len());
        }
        assert_eq!(counts, vec![0, 1, 1, 2, 2]);
    }

    #[tokio::test]
    async fn test_update_unknown_session_returns_none() {
        let (manager, _) = manager();
        let (p, c) = turn("tone", "warm");
        let result = manager.update_session("missing", p, c, Vec::new()).await.unwrap();
        assert!(result.is_none());
        assert!(manager.locks.is_empty().await);
    }

    #[tokio::test]
    async fn test_restore_without_checkpoint_expires() {
        let (manager, store) = manager();
        let id = manager.create_session("u1").await.unwrap().session_id;

        assert!(manager.restore_session(&id).await.unwrap().is_none());
        assert!(store.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_with_recent_checkpoint() {
        let (manager, _) = manager();
        let id = manager.create_session("u1").await.unwrap().session_id;
        manager.save_checkpoint(&id).await.unwrap().unwrap();

        let restored = manager.restore_session(&id).await.unwrap().unwrap();
        assert_eq!(restored.session_id, id);
        assert_eq!(restored.checkpoints.len(), 1);
    }

    #[tokio::test]
    async fn test_restore_with_stale_checkpoint_expires() {
        let (manager, store) = manager();
        let id = manager.create_session("u1").await.unwrap().session_id;
        manager.save_checkpoint(&id).await.unwrap();

        let mut state = store.get(&id).await.unwrap().unwrap();
        state.checkpoints[0].timestamp = Utc::now() - chrono::Duration::hours(25);
        store.put(state).await.unwrap();

        assert!(manager.restore_session(&id).await.unwrap().is_none());
        assert!(store.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_complete_session() {
        let (manager, store) = manager();
        assert!(!manager.complete_session("missing").await.unwrap());

        let id = manager.create_session("u1").await.unwrap().session_id;
        assert!(manager.complete_session(&id).await.unwrap());

        let state = store.get(&id).await.unwrap().unwrap();
        assert_eq!(state.phase, Phase::Completed);
        assert!(state.completed_at.is_some());
        assert_eq!(state.checkpoints.len(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_expired() {
        let (manager, store) = manager();
        let fresh = manager.create_session("fresh").await.unwrap().session_id;
        manager.save_checkpoint(&fresh).await.unwrap();
        let never_checkpointed = manager.create_session("idle").await.unwrap().session_id;

        let removed = manager.cleanup().await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.get(&fresh).await.unwrap().is_some());
        assert!(store.get(&never_checkpointed).await.unwrap().is_none());
    }

    /// Lists one id that no longer resolves, as if deleted after listing.
    struct VanishingStore {
        inner: InMemorySessionStore,
    }

    #[async_trait::async_trait]
    impl PersonaSessionStore for VanishingStore {
        async fn get(&self, session_id: &str) -> Result<Option<PersonaState>> {
            self.inner.get(session_id).await
        }

        async fn put(&self, state: PersonaState) -> Result<()> {
            self.inner.put(state).await
        }

        async fn delete(&self, session_id: &str) -> Result<bool> {
            self.inner.delete(session_id).await
        }

        async fn list_ids(&self) -> Result<Vec<String>> {
            let mut ids = self.inner.list_ids().await?;
            ids.push("persona_gone_1".to_string());
            Ok(ids)
        }
    }

    #[tokio::test]
    async fn test_cleanup_releases_lock_of_vanished_session() {
        let store = Arc::new(VanishingStore {
            inner: InMemorySessionStore::new(),
        });
        let manager = PersonaSessionManager::new(store, SessionConfig::default());
        manager.create_session("idle").await.unwrap();

        assert_eq!(manager.cleanup().await.unwrap(), 1);
        assert!(manager.locks.is_empty().await);
    }

    #[tokio::test]
    async fn test_stats_unknown_session() {
        let (manager, _) = manager();
        assert!(manager.session_stats("missing").await.unwrap().is_none());
        assert!(manager.save_checkpoint("missing").await.unwrap().is_none());
    }
}
