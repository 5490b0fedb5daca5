//! Installs the global `tracing` subscriber for a Mimic instance.
//!
//! The engine crates only emit events. The host process usually owns stdout
//! and often has its own `RUST_LOG`, so the defaults here stay out of its way:
//!
//! - lines go to stderr unless configured otherwise
//! - `MIMIC_LOG` (not `RUST_LOG`) replaces the configured level
//! - a relative log file is placed under the plugin's data directory,
//!   `logs/mimic.log` when no path is configured
//!
//! Hosts that already install a subscriber call
//! [`MimicBuilder::with_logging(false)`](crate::MimicBuilder::with_logging).
//!
//! ```rust,ignore
//! LoggingBuilder::new()
//!     .directive("mimic_framework::dispatch=trace")
//!     .span_events(SpanEvents::LIFECYCLE)
//!     .init();
//! ```

use std::path::{Path, PathBuf};

use tracing::warn;
use tracing_appender::rolling;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{LogFormat, LogOutput, LogRotation, LoggingConfig, SpanEventConfig};

/// Overrides the configured filter when set.
pub const LOG_ENV: &str = "MIMIC_LOG";

/// Used for file output without a configured path.
pub const DEFAULT_LOG_FILE: &str = "logs/mimic.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Which span lifecycle events are logged.
///
/// Every dispatch runs in a `dispatch` span, so [`SpanEvents::LIFECYCLE`]
/// prints one line per dispatched event with its duration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanEvents {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

impl SpanEvents {
    pub const NONE: Self = Self::from_flags(false, false, false, false);
    /// Span creation and close.
    pub const LIFECYCLE: Self = Self::from_flags(true, false, false, true);
    pub const FULL: Self = Self::from_flags(true, true, true, true);

    const fn from_flags(new: bool, enter: bool, exit: bool, close: bool) -> Self {
        Self {
            new,
            enter,
            exit,
            close,
        }
    }

    fn to_fmt_span(self) -> fmt::format::FmtSpan {
        use fmt::format::FmtSpan;

        [
            (self.new, FmtSpan::NEW),
            (self.enter, FmtSpan::ENTER),
            (self.exit, FmtSpan::EXIT),
            (self.close, FmtSpan::CLOSE),
        ]
        .into_iter()
        .filter(|(on, _)| *on)
        .fold(FmtSpan::NONE, |acc, (_, span)| acc | span)
    }
}

impl From<&SpanEventConfig> for SpanEvents {
    fn from(config: &SpanEventConfig) -> Self {
        Self::from_flags(config.new, config.enter, config.exit, config.close)
    }
}

/// Installs the subscriber described by `config`. Relative file paths are
/// resolved against `data_dir`. Does nothing if a subscriber is already
/// installed.
pub fn init_from_config(config: &LoggingConfig, data_dir: Option<&Path>) {
    let mut builder = LoggingBuilder::from_config(config);
    if let Some(dir) = data_dir {
        builder = builder.data_dir(dir);
    }
    builder.init();
}

// =============================================================================
// LoggingBuilder
// =============================================================================

/// A builder for the global tracing subscriber.
#[derive(Debug)]
pub struct LoggingBuilder {
    level: tracing::Level,
    directives: Vec<String>,
    span_events: SpanEvents,
    format: LogFormat,
    output: LogOutput,
    rotation: LogRotation,
    thread_ids: bool,
    file_location: bool,
    file_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::from_config(&LoggingConfig::default())
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut filters: Vec<_> = config.filters.iter().collect();
        filters.sort_by(|a, b| a.0.cmp(b.0));

        Self {
            level: config.level.to_tracing_level(),
            directives: filters
                .into_iter()
                .map(|(target, level)| format!("{target}={level}"))
                .collect(),
            span_events: SpanEvents::from(&config.span_events),
            format: config.format,
            output: config.output,
            rotation: config.rotation,
            thread_ids: config.thread_ids,
            file_location: config.file_location,
            file_path: config.file_path.clone(),
            data_dir: None,
        }
    }

    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = level;
        self
    }

    /// Adds a filter directive such as `mimic_framework=trace`.
    pub fn directive(mut self, directive: &str) -> Self {
        self.directives.push(directive.to_string());
        self
    }

    pub fn span_events(mut self, events: SpanEvents) -> Self {
        self.span_events = events;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn file_path(mut self, path: PathBuf) -> Self {
        self.file_path = Some(path);
        self
    }

    /// Base directory for relative log file paths.
    pub fn data_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.data_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Where file output is written.
    pub fn log_file(&self) -> PathBuf {
        let path = self
            .file_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
        match &self.data_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        }
    }

    fn filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str().to_lowercase()));

        for directive in &self.directives {
            match directive.parse() {
                Ok(d) => filter = filter.add_directive(d),
                Err(err) => warn!(directive = %directive, error = %err, "Ignoring log directive"),
            }
        }
        filter
    }

    fn writer(&self) -> BoxMakeWriter {
        match self.output {
            LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
            LogOutput::File => {
                let path = self.log_file();
                let directory = path.parent().unwrap_or_else(|| Path::new("."));
                let file_name = path
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("mimic.log"));
                let appender = match self.rotation {
                    LogRotation::Never => rolling::never(directory, file_name),
                    LogRotation::Hourly => rolling::hourly(directory, file_name),
                    LogRotation::Daily => rolling::daily(directory, file_name),
                };
                BoxMakeWriter::new(appender)
            }
        }
    }

    /// The fmt layer for the configured format, and whether JSON was
    /// requested without the `json-log` feature.
    fn layer(&self) -> (BoxedLayer, bool) {
        let writer = self.writer();
        let spans = self.span_events.to_fmt_span();
        let base = fmt::layer()
            .with_span_events(spans)
            .with_thread_ids(self.thread_ids)
            .with_file(self.file_location)
            .with_line_number(self.file_location)
            .with_writer(writer);

        match self.format {
            #[cfg(feature = "json-log")]
            LogFormat::Json => (base.json().with_filter(self.filter()).boxed(), false),
            #[cfg(not(feature = "json-log"))]
            LogFormat::Json => (base.compact().with_filter(self.filter()).boxed(), true),
            LogFormat::Compact => (base.compact().with_filter(self.filter()).boxed(), false),
            LogFormat::Pretty => (base.pretty().with_filter(self.filter()).boxed(), false),
            LogFormat::Full => (base.with_filter(self.filter()).boxed(), false),
        }
    }

    /// Installs the subscriber, ignoring failure.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Installs the subscriber. Fails if one is already installed.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let (layer, json_fallback) = self.layer();
        tracing_subscriber::registry().with(layer).try_init()?;
        if json_fallback {
            warn!("JSON logging requires the json-log feature, using compact format");
        }
        Ok(())
    }
}
