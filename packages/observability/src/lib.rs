//! # Observability
//!
//! Logging setup shared by every Vigor crate.
//!
//! Library code only ever calls `tracing` macros. The embedding application calls
//! [`init_with_config`] once at startup, which decides where the events go:
//!
//! - a central JSONL file (`~/.vigor/logs/dev.jsonl` unless overridden), one
//!   object per line, safe to `tail -f | jq`
//! - optionally a compact, human-readable stderr stream
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "vigor-ui".into(),
//!     default_level: "debug".into(),
//!     also_stderr: true,
//!     ..Default::default()
//! });
//! tracing::info!("session coordinator ready");
//! ```

#[cfg(feature = "file-sink")]
mod dev;

mod json_layer;

pub use json_layer::{JsonLayer, LogEntry, REDACTED_FIELDS};

use std::path::PathBuf;

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, included in every log line for filtering.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional custom log file path.
    /// Defaults to `~/.vigor/logs/dev.jsonl`.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr for immediate feedback.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize logging with default settings for the given service.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with custom configuration.
///
/// Installing a second global subscriber is a no-op, so calling this more
/// than once (for example from several tests) is harmless.
pub fn init_with_config(config: LogConfig) {
    #[cfg(feature = "file-sink")]
    {
        dev::init_file_subscriber(&config);
    }

    #[cfg(not(feature = "file-sink"))]
    {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.default_level)),
            )
            .with_target(true)
            .compact()
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Central log file location: `~/.vigor/logs/dev.jsonl`.
///
/// Falls back to the system temp directory when no home directory exists
/// (sandboxed mobile targets, CI containers).
pub fn default_log_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".vigor")
        .join("logs")
        .join("dev.jsonl")
}

pub use tracing::{debug, error, info, instrument, trace, warn, Level};
