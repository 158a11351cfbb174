//! File system paths.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Durable session store filename under the base directory.
const SESSION_STORE_NAME: &str = "session.json";

/// Manages file system paths for the application.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for application files (~/.vigor)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.vigor`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".vigor"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.vigor).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.vigor/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the durable session store path (~/.vigor/session.json).
    pub fn session_store_file(&self) -> PathBuf {
        self.base_dir.join(SESSION_STORE_NAME)
    }

    /// Get the logs directory (~/.vigor/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the central JSONL log file (~/.vigor/logs/dev.jsonl).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("dev.jsonl")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
