//! Unified path management for tally configuration and data files.
//!
//! This ensures consistency across all platforms (Linux, macOS, Windows).

use std::path::{Path, PathBuf};

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config/data directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for tally_core::TallyError {
    fn from(err: PathError) -> Self {
        tally_core::TallyError::config(err.to_string())
    }
}

const APP_DIR: &str = "tally";

/// Unified path management for tally.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/tally/             # Config directory
/// └── config.toml              # Application configuration
///
/// ~/.local/share/tally/        # Data directory (overridable)
/// ├── sessions/                # One TOML file per session
/// │   └── <session-id>.toml
/// └── logs/                    # TUI logs
///     └── tally.log.YYYY-MM-DD
/// ```
pub struct TallyPaths;

impl TallyPaths {
    /// Returns the tally configuration directory (e.g., `~/.config/tally/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the tally data directory (e.g., `~/.local/share/tally/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Sessions directory under a data root.
    pub fn sessions_dir(data_dir: &Path) -> PathBuf {
        data_dir.join("sessions")
    }

    /// Logs directory under a data root.
    pub fn logs_dir(data_dir: &Path) -> PathBuf {
        data_dir.join("logs")
    }
}
