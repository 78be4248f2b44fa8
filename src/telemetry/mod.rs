//! Logging and spans.
//!
//! Every request to a controller runs inside an `aos_request` span and every
//! module run inside an `aos_module` span. Paths are recorded without their
//! query string.
//!
//! ```rust,ignore
//! use rustible_aos::config::Config;
//! use rustible_aos::telemetry::init_logging;
//!
//! let config = Config::load(None)?;
//! init_logging(config.logging.to_logging_config())?;
//! ```

pub mod config;
pub mod logging;
pub mod spans;

pub use config::{LogFormat, LogLevel, LoggingConfig};
pub use logging::{init_dev_logging, init_json_logging, LoggingBuilder};
pub use spans::{create_module_span, create_request_span, SpanExt};

/// Install the global subscriber described by `config`.
pub fn init_logging(config: LoggingConfig) -> crate::error::Result<()> {
    LoggingBuilder::from_config(config).init()
}
