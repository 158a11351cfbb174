//! Logging initialization.
//!
//! Thin wrapper over the observability package so embedders get the same
//! JSONL stream (`~/.vigor/logs/dev.jsonl`) with one call.

use observability::LogConfig;

const DEFAULT_SERVICE_NAME: &str = "vigor";

/// Initialize logging for the application.
///
/// `level` is the default filter; `RUST_LOG` still wins when set.
///
/// ```ignore
/// let config = Config::load(&paths)?;
/// init_logging(&config.log_level);
/// tracing::info!("app started");
/// ```
pub fn init_logging(level: &str) {
    init_logging_for_service(DEFAULT_SERVICE_NAME, level);
}

/// Initialize logging with a custom service name, to tell components apart
/// in the shared log stream.
pub fn init_logging_for_service(service_name: &str, level: &str) {
    let also_stderr = std::env::var("VIGOR_LOG_STDERR")
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false);

    observability::init_with_config(LogConfig {
        service_name: service_name.into(),
        default_level: parse_level(level).to_string().to_lowercase(),
        also_stderr,
        ..Default::default()
    });
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
