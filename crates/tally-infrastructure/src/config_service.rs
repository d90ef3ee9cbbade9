//! Configuration service implementation.
//!
//! Loads `TallyConfig` from `config.toml` (by default `~/.config/tally/config.toml`)
//! and caches it.

use crate::paths::TallyPaths;
use crate::storage::AtomicTomlFile;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tally_core::TallyError;
use tally_core::config::TallyConfig;
use tally_core::error::Result;

/// Configuration service that loads and caches the application configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration; `None` until first load or after invalidation.
    config: Arc<RwLock<Option<TallyConfig>>>,
}

impl ConfigService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Uses the platform config file.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(TallyPaths::config_file()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the configuration, reading the file if not cached.
    ///
    /// A missing file yields the defaults. Nothing is written; see
    /// [`write_defaults_if_missing`](Self::write_defaults_if_missing).
    pub fn load(&self) -> Result<TallyConfig> {
        {
            let cached = self
                .config
                .read()
                .map_err(|_| TallyError::internal("config cache lock poisoned"))?;
            if let Some(config) = cached.as_ref() {
                return Ok(config.clone());
            }
        }

        let loaded = AtomicTomlFile::<TallyConfig>::new(self.path.clone())
            .load()?
            .unwrap_or_default();

        let mut cached = self
            .config
            .write()
            .map_err(|_| TallyError::internal("config cache lock poisoned"))?;
        *cached = Some(loaded.clone());
        Ok(loaded)
    }

    /// Creates the config file with the defaults so users have something to edit.
    ///
    /// Returns `false` when a file already exists.
    pub fn write_defaults_if_missing(&self) -> Result<bool> {
        let file = AtomicTomlFile::<TallyConfig>::new(self.path.clone());
        let written = file.insert_new(&TallyConfig::default())?;
        if written {
            tracing::info!("Wrote default configuration to {:?}", self.path);
        }
        Ok(written)
    }
}
