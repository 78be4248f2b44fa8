//! Subscriber installation.
//!
//! `RUST_LOG`, when set, replaces the configured directives entirely.

use tracing::Subscriber;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use super::config::{LogFormat, LogLevel, LoggingConfig};
use crate::error::{Error, Result};

/// Builder for the global tracing subscriber.
#[derive(Debug, Clone, Default)]
pub struct LoggingBuilder {
    config: LoggingConfig,
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: LoggingConfig) -> Self {
        Self { config }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn with_ansi(mut self, enabled: bool) -> Self {
        self.config.ansi_colors = enabled;
        self
    }

    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.config.timestamps = enabled;
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.config.span_events = enabled;
        self
    }

    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }

    /// Install the subscriber globally. Fails if one is already installed.
    pub fn init(self) -> Result<()> {
        let filter = self.build_filter()?;
        let layer = self.build_layer();

        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()
            .map_err(|e| Error::Config(format!("failed to install log subscriber: {}", e)))
    }

    /// Formatting layer for composing with other layers.
    pub fn build_layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync + 'static>
    where
        S: Subscriber + for<'a> LookupSpan<'a> + Send + Sync,
    {
        let span_events = if self.config.span_events {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let base = tracing_subscriber::fmt::layer()
            .with_ansi(self.config.ansi_colors && self.config.format != LogFormat::Json)
            .with_span_events(span_events);

        match (self.config.format, self.config.timestamps) {
            (LogFormat::Pretty, true) => base.pretty().boxed(),
            (LogFormat::Pretty, false) => base.pretty().without_time().boxed(),
            (LogFormat::Compact, true) => base.compact().boxed(),
            (LogFormat::Compact, false) => base.compact().without_time().boxed(),
            (LogFormat::Json, true) => base.json().with_current_span(true).boxed(),
            (LogFormat::Json, false) => base
                .json()
                .with_current_span(true)
                .without_time()
                .boxed(),
        }
    }

    fn build_filter(&self) -> Result<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        let directives = self.config.directives();
        EnvFilter::try_new(&directives)
            .map_err(|e| Error::invalid_config("logging.filter", format!("{}: {}", directives, e)))
    }
}

/// Install JSON logging.
pub fn init_json_logging() -> Result<()> {
    LoggingBuilder::from_config(LoggingConfig::production()).init()
}

/// Install pretty debug logging.
pub fn init_dev_logging() -> Result<()> {
    LoggingBuilder::from_config(LoggingConfig::development()).init()
}
