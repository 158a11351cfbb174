//! Configuration, filesystem layout and logging setup shared by the Vigor
//! session crates.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, CoordinatorSettings, DEFAULT_LOG_LEVEL};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, init_logging_for_service, parse_level};
pub use paths::Paths;
