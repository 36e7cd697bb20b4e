//! Structured logging setup.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the application. [`init_logging`] is the stock way to do it:
//!
//! | Variable                       | Default | Meaning                                  |
//! |--------------------------------|---------|------------------------------------------|
//! | `SENGOKU_LOG_LEVEL`            | `info`  | Base level when `RUST_LOG` is unset       |
//! | `SENGOKU_LOG_FORMAT`           | `json`  | `json`, `pretty` or `compact`             |
//! | `SENGOKU_LOG_WRITER`           | `stdout`| `stdout` or `stderr`                      |
//! | `SENGOKU_LOG_ASYNC`            | `false` | Write through a background thread         |
//! | `SENGOKU_LOG_TARGET_FILTER`    | *(unset)* | Extra directives, comma-separated       |
//! | `SENGOKU_LOG_INCLUDE_LOCATION` | `false` | Add `file:line` to every event            |

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event
    #[default]
    Json,
    /// Multi-line, human oriented
    Pretty,
    /// Single line, human oriented
    Compact,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => anyhow::bail!("unknown log format '{other}'"),
        }
    }
}

/// Stream the events are written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogWriter {
    #[default]
    Stdout,
    /// Keeps stdout free for program output
    Stderr,
}

impl FromStr for LogWriter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdout" => Ok(LogWriter::Stdout),
            "stderr" => Ok(LogWriter::Stderr),
            other => anyhow::bail!("unknown log writer '{other}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub level: Level,
    pub format: LogFormat,
    pub writer: LogWriter,
    pub non_blocking: bool,
    /// Extra `EnvFilter` directives such as `sengoku::router=trace`
    pub directives: Vec<String>,
    pub with_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Json,
            writer: LogWriter::Stdout,
            non_blocking: false,
            directives: Vec::new(),
            with_location: false,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl LogConfig {
    /// Read the `SENGOKU_LOG_*` variables. Unparseable values keep their
    /// defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            level: env_parse("SENGOKU_LOG_LEVEL").unwrap_or(defaults.level),
            format: env_parse("SENGOKU_LOG_FORMAT").unwrap_or(defaults.format),
            writer: env_parse("SENGOKU_LOG_WRITER").unwrap_or(defaults.writer),
            non_blocking: env_parse("SENGOKU_LOG_ASYNC").unwrap_or(defaults.non_blocking),
            directives: env::var("SENGOKU_LOG_TARGET_FILTER")
                .map(|v| split_directives(&v))
                .unwrap_or_default(),
            with_location: env_parse("SENGOKU_LOG_INCLUDE_LOCATION")
                .unwrap_or(defaults.with_location),
        }
    }

    /// Debug level, compact output with source locations.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Compact,
            with_location: true,
            ..Self::default()
        }
    }

    /// `RUST_LOG` wins over the configured level when set; extra directives
    /// are layered on top either way.
    pub(crate) fn env_filter(&self) -> Result<EnvFilter> {
        let base = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()));
        self.directives.iter().try_fold(base, |filter, d| {
            let directive = d
                .parse()
                .with_context(|| format!("invalid log directive '{d}'"))?;
            Ok(filter.add_directive(directive))
        })
    }
}

fn split_directives(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

/// Holds the background writer when logging is non-blocking. Dropping it
/// flushes pending events.
#[must_use = "dropping the guard stops asynchronous log output"]
pub struct LoggingGuard {
    _worker: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// Fails on an invalid directive or when a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> Result<LoggingGuard> {
    let filter = config.env_filter()?;

    let (writer, worker) = match (config.writer, config.non_blocking) {
        (LogWriter::Stdout, true) => {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
            (BoxMakeWriter::new(writer), Some(guard))
        }
        (LogWriter::Stderr, true) => {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
            (BoxMakeWriter::new(writer), Some(guard))
        }
        (LogWriter::Stdout, false) => (BoxMakeWriter::new(std::io::stdout), None),
        (LogWriter::Stderr, false) => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let base = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_file(config.with_location)
        .with_line_number(config.with_location);
    let layer = match config.format {
        LogFormat::Json => base.json().with_current_span(true).boxed(),
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Compact => base.compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    Ok(LoggingGuard { _worker: worker })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" pretty ".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_writer_from_str() {
        assert_eq!("STDERR".parse::<LogWriter>().unwrap(), LogWriter::Stderr);
        assert_eq!("stdout".parse::<LogWriter>().unwrap(), LogWriter::Stdout);
        assert!("syslog".parse::<LogWriter>().is_err());
        assert_eq!(LogConfig::default().writer, LogWriter::Stdout);
    }

    #[test]
    fn test_split_directives_skips_blanks() {
        assert_eq!(
            split_directives("sengoku::router=trace, ,hyper=warn,"),
            vec!["sengoku::router=trace", "hyper=warn"]
        );
    }

    #[test]
    fn test_invalid_directive_is_an_error() {
        let cfg = LogConfig {
            directives: vec!["sengoku=loudest".to_string()],
            ..LogConfig::default()
        };
        let err = cfg.env_filter().unwrap_err();
        assert!(err.to_string().contains("sengoku=loudest"));
    }

    #[test]
    fn test_development_preset() {
        let cfg = LogConfig::development();
        assert_eq!(cfg.level, Level::DEBUG);
        assert_eq!(cfg.format, LogFormat::Compact);
        assert!(cfg.with_location);
        assert!(!cfg.non_blocking);
    }
}
