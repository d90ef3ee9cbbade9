//! TOML-based SessionRepository implementation.

use crate::paths::TallyPaths;
use crate::storage::AtomicTomlFile;
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use tally_core::TallyError;
use tally_core::error::Result;
use tally_core::session::{Session, SessionRepository};

/// Stores each session as its own TOML file.
///
/// ```text
/// data_dir/
/// └── sessions/
///     ├── <session-id-1>.toml
///     └── <session-id-2>.toml
/// ```
///
/// File I/O is synchronous and runs on tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct TomlSessionRepository {
    sessions_dir: PathBuf,
}

impl TomlSessionRepository {
    /// Creates a repository rooted at `data_dir`, creating `sessions/` if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory structure cannot be created.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let sessions_dir = TallyPaths::sessions_dir(data_dir.as_ref());
        fs::create_dir_all(&sessions_dir)?;
        Ok(Self { sessions_dir })
    }

    /// Creates a repository at the platform data directory (~/.local/share/tally).
    pub fn default_location() -> Result<Self> {
        Self::new(TallyPaths::data_dir()?)
    }

    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    fn session_file(&self, session_id: &str) -> Result<AtomicTomlFile<Session>> {
        if !is_safe_id(session_id) {
            return Err(TallyError::validation(format!(
                "invalid session id '{session_id}'"
            )));
        }
        Ok(AtomicTomlFile::new(
            self.sessions_dir.join(format!("{session_id}.toml")),
        ))
    }
}

/// Ids become file names, so they must not escape the sessions directory.
fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

async fn blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| TallyError::internal(format!("storage task failed: {e}")))?
}

fn read_all(sessions_dir: &Path) -> Result<Vec<Session>> {
    let mut sessions = Vec::new();

    for entry in fs::read_dir(sessions_dir)? {
        let path = entry?.path();
        let is_session_file = path.extension().is_some_and(|ext| ext == "toml")
            && path
                .file_name()
                .is_some_and(|name| !name.to_string_lossy().starts_with('.'));
        if !is_session_file {
            continue;
        }

        match AtomicTomlFile::<Session>::new(path.clone()).load() {
            Ok(Some(session)) => sessions.push(session),
            Ok(None) => tracing::debug!("Skipping empty session file: {:?}", path),
            Err(e) => {
                // Keep loading the other sessions
                tracing::warn!("Failed to load session file {:?}: {}", path, e);
            }
        }
    }

    Ok(sessions)
}

#[async_trait]
impl SessionRepository for TomlSessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        if !is_safe_id(session_id) {
            return Ok(None);
        }
        let file = self.session_file(session_id)?;
        blocking(move || file.load()).await
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let file = self.session_file(&session.id)?;
        let record = session.clone();
        blocking(move || file.save(&record)).await?;
        tracing::debug!(session_id = %session.id, "Saved session file");
        Ok(())
    }

    async fn add(&self, session: &Session) -> Result<()> {
        let file = self.session_file(&session.id)?;
        let record = session.clone();
        let inserted = blocking(move || file.insert_new(&record)).await?;
        if !inserted {
            return Err(TallyError::already_exists("Session", session.id.clone()));
        }
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        if !is_safe_id(session_id) {
            return Ok(());
        }
        let file = self.session_file(session_id)?;
        blocking(move || file.remove()).await
    }

    async fn list_all(&self) -> Result<Vec<Session>> {
        let sessions_dir = self.sessions_dir.clone();
        blocking(move || read_all(&sessions_dir)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::session::ChoiceDraft;
    use tempfile::TempDir;

    fn create_test_session(name: &str, created_at: i64) -> Session {
        Session::create_at(
            name,
            &[ChoiceDraft::new("Pizza"), ChoiceDraft::new("Tacos")],
            created_at,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_save_and_find_by_id() {
        let temp_dir = TempDir::new().unwrap();
        let repository = TomlSessionRepository::new(temp_dir.path()).unwrap();

        let mut session = create_test_session("Lunch", 1);
        session.choices[0].votes = 4;
        repository.save(&session).await.unwrap();

        let loaded = repository.find_by_id(&session.id).await.unwrap();
        assert_eq!(loaded, Some(session.clone()));
        assert!(
            repository
                .sessions_dir()
                .join(format!("{}.toml", session.id))
                .exists()
        );
    }

    #[tokio::test]
    async fn test_add_rejects_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let repository = TomlSessionRepository::new(temp_dir.path()).unwrap();
        let session = create_test_session("Lunch", 1);

        repository.add(&session).await.unwrap();
        let err = repository.add(&session).await.unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn test_list_all_skips_corrupt_files() {
        let temp_dir = TempDir::new().unwrap();
        let repository = TomlSessionRepository::new(temp_dir.path()).unwrap();

        repository.save(&create_test_session("One", 1)).await.unwrap();
        repository.save(&create_test_session("Two", 2)).await.unwrap();
        fs::write(repository.sessions_dir().join("broken.toml"), "name = ").unwrap();
        fs::write(repository.sessions_dir().join("notes.txt"), "ignored").unwrap();

        let sessions = repository.list_all().await.unwrap();
        let mut names: Vec<_> = sessions.iter().map(|s| s.name.as_str()).collect();
        names.sort();
        assert_eq!(names, ["One", "Two"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let repository = TomlSessionRepository::new(temp_dir.path()).unwrap();
        let session = create_test_session("Doomed", 1);
        repository.save(&session).await.unwrap();

        repository.delete(&session.id).await.unwrap();
        assert!(repository.find_by_id(&session.id).await.unwrap().is_none());

        // Deleting again is a no-op.
        repository.delete(&session.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_unsafe_ids() {
        let temp_dir = TempDir::new().unwrap();
        let repository = TomlSessionRepository::new(temp_dir.path()).unwrap();

        assert!(repository.find_by_id("../escape").await.unwrap().is_none());
        repository.delete("../escape").await.unwrap();

        let mut session = create_test_session("Bad", 1);
        session.id = "../escape".to_string();
        assert!(repository.save(&session).await.is_err());
    }
}
