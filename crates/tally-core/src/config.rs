//! Application configuration model.
//!
//! Mirrors `config.toml`. Every field has a default so a partial (or missing)
//! file is always valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct TallyConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageConfig {
    /// Overrides the platform data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

/// Transition timings for the ranking list.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MotionConfig {
    /// Reorder (FLIP) slide duration
    pub reorder_ms: u64,
    pub enter_ms: u64,
    pub exit_ms: u64,
    /// Vote bar growth duration
    pub bar_ms: u64,
    /// Rows an entering node slides up from
    pub enter_offset: f32,
    /// Disables every transition
    pub reduced_motion: bool,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            reorder_ms: 260,
            enter_ms: 260,
            exit_ms: 180,
            bar_ms: 420,
            enter_offset: 1.0,
            reduced_motion: false,
        }
    }
}

impl MotionConfig {
    fn duration(&self, ms: u64) -> Duration {
        if self.reduced_motion {
            Duration::ZERO
        } else {
            Duration::from_millis(ms)
        }
    }

    pub fn reorder(&self) -> Duration {
        self.duration(self.reorder_ms)
    }

    pub fn enter(&self) -> Duration {
        self.duration(self.enter_ms)
    }

    pub fn exit(&self) -> Duration {
        self.duration(self.exit_ms)
    }

    pub fn bar(&self) -> Duration {
        self.duration(self.bar_ms)
    }

    /// Zero-duration timings, handy for tests and `--no-motion`.
    pub fn instant() -> Self {
        Self {
            reduced_motion: true,
            ..Self::default()
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Default `EnvFilter` directive, e.g. `info` or `tally_application=debug`
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
