//! Structured logging setup shared by the binaries and test harnesses

use serde::{Deserialize, Serialize};
use std::io;
use std::str::FromStr;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Whether to include file and line information
    pub include_location: bool,
    /// Whether to log span close events with their duration
    pub log_span_timings: bool,
    /// Log file path; stdout when absent
    pub log_file_path: Option<String>,
    /// Custom filter directives
    pub filter_directives: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            include_location: false,
            log_span_timings: false,
            log_file_path: None,
            filter_directives: vec![
                "dihadi_core=debug".to_string(),
                "dihadi_client=debug".to_string(),
            ],
        }
    }
}

impl LoggingConfig {
    /// Filter string combining the level and the custom directives
    pub fn filter_string(&self) -> String {
        std::iter::once(self.level.clone())
            .chain(self.filter_directives.iter().cloned())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Initialize the global subscriber. `RUST_LOG` overrides the configured filter.
pub fn init_logging(
    config: &LoggingConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.filter_string()))?;

    let span_events = if config.log_span_timings {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let registry = tracing_subscriber::registry().with(filter);

    let file = match &config.log_file_path {
        Some(path) => Some(
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?,
        ),
        None => None,
    };

    match (config.format, file) {
        (LogFormat::Json, Some(file)) => registry
            .with(
                fmt::layer()
                    .json()
                    .with_span_events(span_events)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_writer(file),
            )
            .try_init()?,
        (LogFormat::Json, None) => registry
            .with(
                fmt::layer()
                    .json()
                    .with_span_events(span_events)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_writer(io::stdout),
            )
            .try_init()?,
        (LogFormat::Pretty, Some(file)) => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_span_events(span_events)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_writer(file),
            )
            .try_init()?,
        (LogFormat::Pretty, None) => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_span_events(span_events)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_writer(io::stdout),
            )
            .try_init()?,
        (LogFormat::Compact, Some(file)) => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_span_events(span_events)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_writer(file),
            )
            .try_init()?,
        (LogFormat::Compact, None) => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_span_events(span_events)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_writer(io::stdout),
            )
            .try_init()?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_string() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            filter_directives: vec!["dihadi_web=debug".to_string()],
            ..Default::default()
        };
        assert_eq!(config.filter_string(), "warn,dihadi_web=debug");
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!(" pretty ".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
