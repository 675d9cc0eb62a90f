//! Persona session store trait.
//!
//! Defines the interface the session manager persists through.

use super::state::PersonaState;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract store for persona session state.
///
/// This trait decouples the state machine from where sessions live (process
/// memory today, a shared cache or database later). Implementations only
/// need to be individually atomic per call; the session manager serializes
/// read-modify-write sequences per session id.
#[async_trait]
pub trait PersonaSessionStore: Send + Sync {
    /// Finds a session by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(PersonaState))`: Session found
    /// - `Ok(None)`: Session not found
    /// - `Err(InboxError)`: The backend failed
    async fn get(&self, session_id: &str) -> Result<Option<PersonaState>>;

    /// Inserts or replaces a session.
    async fn put(&self, state: PersonaState) -> Result<()>;

    /// Deletes a session.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: Session existed and was removed
    /// - `Ok(false)`: Session did not exist
    async fn delete(&self, session_id: &str) -> Result<bool>;

    /// Lists the IDs of all stored sessions.
    async fn list_ids(&self) -> Result<Vec<String>>;
}
