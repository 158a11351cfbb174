//! Configuration management.

use crate::{CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable overriding the log level.
const LOG_LEVEL_ENV: &str = "VIGOR_LOG_LEVEL";

/// Environment variable overriding the session-check debounce window.
const DEBOUNCE_ENV: &str = "VIGOR_AUTH_DEBOUNCE_MS";

/// Environment variable overriding the per-attempt session-check timeout.
const CHECK_TIMEOUT_ENV: &str = "VIGOR_AUTH_CHECK_TIMEOUT_MS";

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Timings and limits for the session coordinator.
    #[serde(default)]
    pub coordinator: CoordinatorSettings,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            coordinator: CoordinatorSettings::default(),
        }
    }
}

/// Tunables for the auth session coordinator.
///
/// All durations are milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorSettings {
    /// Minimum spacing between two effectful session checks.
    pub debounce_window_ms: u64,
    /// Hard timeout applied to each `get_session` attempt.
    pub check_timeout_ms: u64,
    /// Attempts made by the retry policy before giving up.
    pub retry_max_attempts: u8,
    /// Delay after the first failed attempt; doubles after each further failure.
    pub retry_base_delay_ms: u32,
    /// Delay between rehydration and the first validating check.
    pub rehydrate_delay_ms: u64,
    /// How long a `Checking` state may last before the watchdog resets it.
    pub watchdog_timeout_ms: u64,
    /// Upper bound on the provider call made by a regular logout.
    pub logout_timeout_ms: u64,
    /// Upper bound on the provider call made by a forced logout.
    pub force_logout_timeout_ms: u64,
    /// Minimum password length accepted by registration.
    pub min_password_len: usize,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            debounce_window_ms: 500,
            check_timeout_ms: 8_000,
            retry_max_attempts: 3,
            retry_base_delay_ms: 1_000,
            rehydrate_delay_ms: 100,
            watchdog_timeout_ms: 10_000,
            logout_timeout_ms: 8_000,
            force_logout_timeout_ms: 2_000,
            min_password_len: 6,
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from the config file, falling back to defaults.
    /// Environment variables take precedence over the file.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from a variable lookup. Unparseable values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup(LOG_LEVEL_ENV).filter(|v| !v.trim().is_empty()) {
            self.log_level = level.trim().to_string();
        }
        if let Some(ms) = lookup(DEBOUNCE_ENV).and_then(|v| v.trim().parse().ok()) {
            self.coordinator.debounce_window_ms = ms;
        }
        if let Some(ms) = lookup(CHECK_TIMEOUT_ENV).and_then(|v| v.trim().parse().ok()) {
            self.coordinator.check_timeout_ms = ms;
        }
    }
}
