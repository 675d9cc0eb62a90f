use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Per-session mutual exclusion.
///
/// Every read-modify-write on a persona session, and the sweep's
/// check-and-delete, runs while holding the guard for that session id, so
/// overlapping requests and the cleanup task cannot interleave on one
/// session. Different sessions never block each other.
#[derive(Clone, Default)]
pub struct SessionLocks {
    locks: Arc<RwLock<HashMap<String, Arc<Mutex<()>>>>>,
}

impl SessionLocks {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `session_id`.
    ///
    /// # Arguments
    ///
    /// * `session_id` - The ID of the session to lock
    ///
    /// # Returns
    ///
    /// A guard that releases the session when dropped.
    pub async fn acquire(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.write().await;
            locks
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Drops the table entry for `session_id` if nobody holds or awaits it.
    ///
    /// Call after the guard is dropped for a session that no longer exists.
    pub async fn release(&self, session_id: &str) {
        let mut locks = self.locks.write().await;
        if locks
            .get(session_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(session_id);
        }
    }

    /// Number of tracked session ids.
    pub async fn len(&self) -> usize {
        self.locks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.locks.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_session_is_serialized() {
        let locks = SessionLocks::new();
        let guard = locks.acquire("s1").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("s1").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_sessions_do_not_block() {
        let locks = SessionLocks::new();
        let _s1 = locks.acquire("s1").await;
        let s2 = tokio::time::timeout(Duration::from_millis(100), locks.acquire("s2")).await;
        assert!(s2.is_ok());
    }

    #[tokio::test]
    async fn test_release_keeps_held_entries() {
        let locks = SessionLocks::new();
        let guard = locks.acquire("s1").await;

        locks.release("s1").await;
        assert_eq!(locks.len().await, 1);

        drop(guard);
        locks.release("s1").await;
        assert!(locks.is_empty().await);
    }
}
