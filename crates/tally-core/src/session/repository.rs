//! Session repository trait.
//!
//! Defines the interface for session persistence operations.

use super::model::Session;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for durable session records.
///
/// One record per session, keyed by the session id. Implementations store the
/// full record on every write; there is no partial update.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Finds a session by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Session))`: Session found
    /// - `Ok(None)`: Session not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>>;

    /// Upserts a session, replacing any stored record with the same id.
    async fn save(&self, session: &Session) -> Result<()>;

    /// Inserts a new session.
    ///
    /// # Errors
    ///
    /// Returns `TallyError::AlreadyExists` if a record with the same id is stored.
    async fn add(&self, session: &Session) -> Result<()>;

    /// Deletes a session from storage.
    ///
    /// - `Ok(())`: Session deleted successfully (or didn't exist)
    /// - `Err(_)`: Error occurred during deletion
    async fn delete(&self, session_id: &str) -> Result<()>;

    /// Lists all stored sessions, in no particular order.
    async fn list_all(&self) -> Result<Vec<Session>>;
}
