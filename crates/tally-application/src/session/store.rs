//! In-memory session state store.

use super::writer::{DurableOp, SessionWriter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tally_core::error::Result;
use tally_core::ranking::SessionSummary;
use tally_core::session::{Choice, ChoiceDraft, Session, SessionRepository, VoteDelta};
use tally_core::view::ViewState;
use tokio::sync::watch;

/// Single source of truth for rendering.
///
/// Mutations change memory and publish a new revision before any durable write
/// is issued; the durable half is queued on the [`SessionWriter`] and never
/// awaited by the caller. Sessions are kept newest first.
pub struct SessionStore {
    sessions: RwLock<Vec<Session>>,
    loading: AtomicBool,
    repository: Arc<dyn SessionRepository>,
    writer: SessionWriter,
    revision: watch::Sender<u64>,
}

impl SessionStore {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            sessions: RwLock::new(Vec::new()),
            loading: AtomicBool::new(true),
            writer: SessionWriter::new(repository.clone()),
            repository,
            revision,
        }
    }

    /// Receiver that changes on every in-memory mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// True until the first [`load_all`](Self::load_all) finishes.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Replaces the in-memory set with every stored session, newest first.
    ///
    /// On failure the store leaves the loading state empty-handed and the error
    /// is returned for the caller to report.
    pub async fn load_all(&self) -> Result<()> {
        let result = self.repository.list_all().await;
        let loaded = match result {
            Ok(mut sessions) => {
                sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                tracing::debug!(count = sessions.len(), "Loaded sessions");
                *self.write() = sessions;
                Ok(())
            }
            Err(e) => Err(e),
        };
        self.loading.store(false, Ordering::SeqCst);
        self.notify();
        loaded
    }

    // ============================================================================
    // Reads
    // ============================================================================

    pub fn sessions(&self) -> Vec<Session> {
        self.read().clone()
    }

    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.read().iter().find(|s| s.id == session_id).cloned()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.read().iter().any(|s| s.id == session_id)
    }

    /// The session the view has open, if it is still loaded.
    pub fn current(&self, view: &ViewState) -> Option<Session> {
        view.session_id().and_then(|id| self.get(id))
    }

    pub fn summaries(&self) -> Vec<SessionSummary> {
        self.read().iter().map(SessionSummary::of).collect()
    }

    // ============================================================================
    // Mutations
    // ============================================================================

    /// Applies one clamped vote, returning the choice's new in-memory tally.
    ///
    /// Unknown session or choice ids are ignored.
    pub fn apply_vote(&self, session_id: &str, choice_id: &str, delta: VoteDelta) -> Option<u32> {
        let votes = self
            .write()
            .iter_mut()
            .find(|s| s.id == session_id)
            .and_then(|s| s.apply_vote(choice_id, delta));

        let Some(votes) = votes else {
            tracing::debug!(session_id, choice_id, "Vote for unknown choice ignored");
            return None;
        };

        tracing::debug!(session_id, choice_id, votes, step = delta.step(), "Vote applied");
        self.notify();
        self.writer.enqueue(
            session_id,
            DurableOp::Vote {
                choice_id: choice_id.to_string(),
                delta,
            },
        );
        Some(votes)
    }

    /// Appends a new zero-vote choice built from `draft`, returning its id.
    ///
    /// Drafts with a blank title are rejected silently.
    pub fn add_choice(&self, session_id: &str, draft: &ChoiceDraft) -> Option<String> {
        if draft.is_blank() {
            tracing::debug!(session_id, "Blank choice draft ignored");
            return None;
        }

        let choice = Choice::from_draft(draft);
        let added = self
            .write()
            .iter_mut()
            .find(|s| s.id == session_id)
            .is_some_and(|s| s.push_choice(choice.clone()));
        if !added {
            tracing::debug!(session_id, "Choice added to unknown session ignored");
            return None;
        }

        tracing::debug!(session_id, choice_id = %choice.id, "Choice added");
        self.notify();
        let choice_id = choice.id.clone();
        self.writer.enqueue(session_id, DurableOp::AddChoice(choice));
        Some(choice_id)
    }

    pub fn remove_choice(&self, session_id: &str, choice_id: &str) -> bool {
        let removed = self
            .write()
            .iter_mut()
            .find(|s| s.id == session_id)
            .is_some_and(|s| s.remove_choice(choice_id));
        if !removed {
            return false;
        }

        tracing::debug!(session_id, choice_id, "Choice removed");
        self.notify();
        self.writer.enqueue(
            session_id,
            DurableOp::RemoveChoice {
                choice_id: choice_id.to_string(),
            },
        );
        true
    }

    /// Creates a session, stores it durably, then exposes it as the newest.
    ///
    /// Returns `None` when the input is invalid (empty name, fewer than two
    /// titled choices) or the durable insert fails.
    pub async fn create_session(&self, name: &str, drafts: &[ChoiceDraft]) -> Option<Session> {
        let Some(session) = Session::create(name, drafts) else {
            tracing::debug!(name, "Session creation rejected by validation");
            return None;
        };

        if let Err(e) = self.repository.add(&session).await {
            tracing::warn!(session_id = %session.id, error = %e, "Failed to store new session");
            return None;
        }

        tracing::debug!(session_id = %session.id, "Session created");
        self.write().insert(0, session.clone());
        self.notify();
        Some(session)
    }

    /// Removes a session from memory and, behind its pending writes, from
    /// durable storage. Returns whether it was loaded.
    pub async fn remove_session(&self, session_id: &str) -> bool {
        let removed = {
            let mut sessions = self.write();
            let before = sessions.len();
            sessions.retain(|s| s.id != session_id);
            sessions.len() != before
        };
        if removed {
            tracing::debug!(session_id, "Session removed");
            self.notify();
        }

        self.writer.delete(session_id).await;
        removed
    }

    /// Waits for every queued durable write.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    fn notify(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Session>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Session>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }
}
