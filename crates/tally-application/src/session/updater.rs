//! Session updater helper for the durable read-modify-write.
//!
//! `SessionUpdater` wraps the "find → update → save" pattern shared by every
//! durable session mutation.

use std::sync::Arc;
use tally_core::error::Result;
use tally_core::session::{Session, SessionRepository};

/// Loads a session record, applies a change and writes it back in full.
#[derive(Clone)]
pub struct SessionUpdater {
    repository: Arc<dyn SessionRepository>,
}

impl SessionUpdater {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self { repository }
    }

    /// Updates a session by applying `updater` to its durable record.
    ///
    /// `updater` returns whether it changed anything; unchanged records are not
    /// written back.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: the record was changed and saved
    /// - `Ok(false)`: the record is absent, or `updater` made no change
    /// - `Err`: loading or saving failed
    pub async fn update<F>(&self, session_id: &str, updater: F) -> Result<bool>
    where
        F: FnOnce(&mut Session) -> bool,
    {
        let Some(mut session) = self.repository.find_by_id(session_id).await? else {
            tracing::debug!(session_id, "[SessionUpdater] Durable record absent, skipping");
            return Ok(false);
        };

        if !updater(&mut session) {
            tracing::debug!(session_id, "[SessionUpdater] Nothing to change");
            return Ok(false);
        }

        self.repository.save(&session).await?;
        tracing::debug!(session_id, "[SessionUpdater] Session saved");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tally_core::TallyError;
    use tally_core::session::{ChoiceDraft, VoteDelta};

    /// Single-record repository that counts saves.
    struct MockRepository {
        session: Mutex<Option<Session>>,
        saves: Mutex<usize>,
    }

    impl MockRepository {
        fn new(session: Option<Session>) -> Self {
            Self {
                session: Mutex::new(session),
                saves: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl SessionRepository for MockRepository {
        async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
            Ok(self
                .session
                .lock()
                .unwrap()
                .clone()
                .filter(|s| s.id == session_id))
        }

        async fn save(&self, session: &Session) -> Result<()> {
            *self.session.lock().unwrap() = Some(session.clone());
            *self.saves.lock().unwrap() += 1;
            Ok(())
        }

        async fn add(&self, _session: &Session) -> Result<()> {
            Err(TallyError::internal("not used"))
        }

        async fn delete(&self, _session_id: &str) -> Result<()> {
            Ok(())
        }

        async fn list_all(&self) -> Result<Vec<Session>> {
            Ok(self.session.lock().unwrap().clone().into_iter().collect())
        }
    }

    fn session() -> Session {
        Session::create_at("Lunch", &[ChoiceDraft::new("Pizza"), ChoiceDraft::new("Tacos")], 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_update_saves_changes() {
        let s = session();
        let choice_id = s.choices[0].id.clone();
        let repository = Arc::new(MockRepository::new(Some(s.clone())));
        let updater = SessionUpdater::new(repository.clone());

        let changed = updater
            .update(&s.id, |session| session.apply_vote(&choice_id, VoteDelta::Up).is_some())
            .await
            .unwrap();

        assert!(changed);
        assert_eq!(*repository.saves.lock().unwrap(), 1);
        let stored = repository.session.lock().unwrap().clone().unwrap();
        assert_eq!(stored.choices[0].votes, 1);
    }

    #[tokio::test]
    async fn test_absent_record_is_noop() {
        let repository = Arc::new(MockRepository::new(None));
        let updater = SessionUpdater::new(repository.clone());

        let changed = updater.update("missing", |_| true).await.unwrap();

        assert!(!changed);
        assert_eq!(*repository.saves.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unchanged_record_is_not_saved() {
        let s = session();
        let repository = Arc::new(MockRepository::new(Some(s.clone())));
        let updater = SessionUpdater::new(repository.clone());

        let changed = updater
            .update(&s.id, |session| session.remove_choice("no-such-choice"))
            .await
            .unwrap();

        assert!(!changed);
        assert_eq!(*repository.saves.lock().unwrap(), 0);
    }
}
