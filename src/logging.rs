//! Structured logging for RecoveryRS
//!
//! The library only emits `tracing` events; binaries call [`init_logging`]
//! once to install a subscriber. Console output goes to stderr because
//! stdout carries command results (tables, JSON).

use serde::{Deserialize, Serialize};
use std::fmt as stdfmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

const DEFAULT_LOG_FILE: &str = "recoveryrs.log";

/// Where and how verbosely the engine logs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum level for `recoveryrs` events; `RUST_LOG` overrides it
    pub level: LogLevel,

    pub format: LogFormat,

    /// Optional JSON log file written alongside the console output
    pub file_path: Option<PathBuf>,

    /// Start a new file each day instead of appending to one file
    pub rotation: bool,

    /// Emit span enter/close events and attach span context
    pub include_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            format: LogFormat::Pretty,
            file_path: None,
            rotation: true,
            include_spans: false,
        }
    }
}

impl LogConfig {
    /// Raise the level by the number of `-v` flags given on the command line
    pub fn with_verbosity(mut self, verbose: u8) -> Self {
        self.level = match verbose {
            0 => self.level,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        };
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl stdfmt::Display for LogLevel {
    fn fmt(&self, f: &mut stdfmt::Formatter<'_>) -> stdfmt::Result {
        let name = match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

/// Console rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, colored
    Pretty,
    /// One JSON object per event
    Json,
    /// One line per event
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// Install the global subscriber
///
/// Fails if a subscriber is already installed or the log file cannot be
/// opened.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("recoveryrs={}", config.level)));

    let mut layers = vec![console_layer(config)];
    if let Some(path) = &config.file_path {
        layers.push(file_layer(path, config)?);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()?;

    tracing::debug!(
        level = %config.level,
        format = ?config.format,
        file = ?config.file_path,
        "Logging initialized"
    );

    Ok(())
}

fn console_layer(config: &LogConfig) -> BoxedLayer {
    let spans = if config.include_spans {
        FmtSpan::ENTER | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    match config.format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_span_events(spans)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(config.include_spans)
            .with_span_list(config.include_spans)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_span_events(spans)
            .boxed(),
    }
}

/// JSON file output, rolled daily or appended to a single file
fn file_layer(path: &Path, config: &LogConfig) -> anyhow::Result<BoxedLayer> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_current_span(config.include_spans)
        .with_span_list(config.include_spans);

    if config.rotation {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(DEFAULT_LOG_FILE);
        let appender = tracing_appender::rolling::daily(dir, name);
        Ok(layer.with_writer(appender).boxed())
    } else {
        let file = fs::OpenOptions::new().create(true).append(true).open(path)?;
        Ok(layer.with_writer(Mutex::new(file)).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_log_level_renders_as_filter_directive() {
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert_eq!(format!("recoveryrs={}", LogLevel::Warn), "recoveryrs=warn");
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
    }

    #[test]
    fn test_verbosity_override() {
        let config = LogConfig::default();
        assert_eq!(config.clone().with_verbosity(0).level, LogLevel::Warn);
        assert_eq!(config.clone().with_verbosity(2).level, LogLevel::Debug);
        assert_eq!(config.with_verbosity(5).level, LogLevel::Trace);
    }

    #[test]
    fn test_file_layer_creates_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("engine.log");
        let config = LogConfig {
            file_path: Some(path.clone()),
            rotation: false,
            ..Default::default()
        };

        file_layer(&path, &config).unwrap();
        assert!(path.exists());
    }
}
