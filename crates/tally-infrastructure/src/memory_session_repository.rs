//! In-memory SessionRepository.
//!
//! Used for `--ephemeral` runs and as a controllable backend in tests: writes can
//! be made to fail and every call can be delayed to widen race windows.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tally_core::TallyError;
use tally_core::error::Result;
use tally_core::session::{Session, SessionRepository};

#[derive(Debug, Default)]
pub struct MemorySessionRepository {
    sessions: Mutex<HashMap<String, Session>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
    latency: Option<Duration>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sessions(sessions: impl IntoIterator<Item = Session>) -> Self {
        let repository = Self::new();
        if let Ok(mut records) = repository.sessions.lock() {
            records.extend(sessions.into_iter().map(|s| (s.id.clone(), s)));
        }
        repository
    }

    /// Delays every call, yielding to other tasks in between.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes `save`, `add` and `delete` fail until switched back.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Synchronous peek at the stored record.
    pub fn snapshot(&self, session_id: &str) -> Option<Session> {
        self.records().ok()?.get(session_id).cloned()
    }

    fn records(&self) -> Result<MutexGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .lock()
            .map_err(|_| TallyError::internal("session map lock poisoned"))
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TallyError::io("simulated write failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        self.pause().await;
        Ok(self.records()?.get(session_id).cloned())
    }

    async fn save(&self, session: &Session) -> Result<()> {
        self.pause().await;
        self.check_writable()?;
        self.records()?.insert(session.id.clone(), session.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn add(&self, session: &Session) -> Result<()> {
        self.pause().await;
        self.check_writable()?;
        let mut records = self.records()?;
        if records.contains_key(&session.id) {
            return Err(TallyError::already_exists("Session", session.id.clone()));
        }
        records.insert(session.id.clone(), session.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.pause().await;
        self.check_writable()?;
        self.records()?.remove(session_id);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Session>> {
        self.pause().await;
        Ok(self.records()?.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::session::ChoiceDraft;

    fn session(name: &str) -> Session {
        Session::create_at(
            name,
            &[ChoiceDraft::new("Yes"), ChoiceDraft::new("No")],
            0,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_crud() {
        let repository = MemorySessionRepository::new();
        let s = session("Poll");

        repository.add(&s).await.unwrap();
        assert!(repository.add(&s).await.unwrap_err().is_already_exists());
        assert_eq!(repository.find_by_id(&s.id).await.unwrap(), Some(s.clone()));
        assert_eq!(repository.list_all().await.unwrap().len(), 1);

        repository.delete(&s.id).await.unwrap();
        repository.delete(&s.id).await.unwrap();
        assert_eq!(repository.find_by_id(&s.id).await.unwrap(), None);
        assert_eq!(repository.write_count(), 3);
    }

    #[tokio::test]
    async fn test_failing_writes() {
        let s = session("Poll");
        let repository = MemorySessionRepository::with_sessions([s.clone()]);
        repository.set_fail_writes(true);

        let mut changed = s.clone();
        changed.name = "Changed".to_string();
        assert!(repository.save(&changed).await.unwrap_err().is_io());
        assert_eq!(repository.snapshot(&s.id), Some(s));
        assert_eq!(repository.write_count(), 0);
    }
}
