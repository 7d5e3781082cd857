// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Centralized logging setup
//!
//! Every binary in the workspace initializes `tracing` through this crate so
//! that filters, formats and log locations behave the same way for the server
//! and for `confctl`.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use tracing::Level;

/// Directory name used under the platform data/log location
const APP_DIR: &str = "conference-attendance";

/// Output format for log messages
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable plaintext format
    #[default]
    Plaintext,
    /// Structured JSON, one object per line
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Plaintext => write!(f, "plaintext"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plaintext" | "text" => Ok(LogFormat::Plaintext),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {s}. Use 'plaintext' or 'json'")),
        }
    }
}

/// Log level accepted on the command line
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CliLogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for Level {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

impl std::fmt::Display for CliLogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CliLogLevel::Error => "error",
            CliLogLevel::Warn => "warn",
            CliLogLevel::Info => "info",
            CliLogLevel::Debug => "debug",
            CliLogLevel::Trace => "trace",
        };
        f.write_str(name)
    }
}

/// Logging flags shared by all binaries.
///
/// Flatten into a clap parser with `#[command(flatten)]`. Output goes to the
/// console unless `--log-file` or `--log-dir` is given.
#[derive(Clone, Debug, Default, clap::Args, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CliLoggingArgs {
    /// Log verbosity level
    #[arg(long, value_enum, global = true, help = "Log verbosity level (default: info)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<CliLogLevel>,

    /// Log output format
    #[arg(long, value_enum, global = true, help = "Log output format (default: plaintext)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_format: Option<LogFormat>,

    /// Directory for log files
    #[arg(long, global = true, help = "Directory for log files (default: platform specific)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// Log filename
    #[arg(long, global = true, help = "Log filename")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

impl CliLoggingArgs {
    /// Install the global subscriber for `component`
    pub fn init(&self, component: &str, default_level: CliLogLevel) -> anyhow::Result<()> {
        let level = self.log_level.unwrap_or(default_level).into();
        let format = self.log_format.unwrap_or_default();

        match self.log_path(component) {
            Some(path) => init_to_file(component, level, format, &path),
            None => init(component, level, format),
        }
    }

    /// File to log into, or `None` for console output.
    ///
    /// An absolute `--log-file` is used as is; a relative one is placed under
    /// `--log-dir` (or the platform log directory when only a name is given).
    pub fn log_path(&self, component: &str) -> Option<PathBuf> {
        match (&self.log_file, &self.log_dir) {
            (None, None) => None,
            (None, Some(dir)) => Some(Path::new(dir).join(format!("{component}.log"))),
            (Some(file), dir) => {
                let file = Path::new(file);
                if file.is_absolute() {
                    Some(file.to_path_buf())
                } else if let Some(dir) = dir {
                    Some(Path::new(dir).join(file))
                } else if file.parent().is_some_and(|p| !p.as_os_str().is_empty()) {
                    Some(file.to_path_buf())
                } else {
                    Some(standard_log_dir().join(file))
                }
            }
        }
    }
}

/// Platform directory for log files
///
/// - macOS: `~/Library/Logs/conference-attendance`
/// - elsewhere: `<data dir>/conference-attendance/logs`
pub fn standard_log_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
        path.push("Library");
        path.push("Logs");
        path.push(APP_DIR);
        path
    }

    #[cfg(not(target_os = "macos"))]
    {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(std::env::temp_dir);
        path.push(APP_DIR);
        path.push("logs");
        path
    }
}

/// Standard log file for `component`
pub fn standard_log_path(component: &str) -> PathBuf {
    standard_log_dir().join(format!("{component}.log"))
}

/// Log to stdout
pub fn init(component: &str, default_level: Level, format: LogFormat) -> anyhow::Result<()> {
    init_with_writer(component, default_level, format, io::stdout)
}

/// Log to `log_path`, appending and creating parent directories as needed
pub fn init_to_file(
    component: &str,
    default_level: Level,
    format: LogFormat,
    log_path: &Path,
) -> anyhow::Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = std::fs::OpenOptions::new().create(true).append(true).open(log_path)?;
    init_with_writer(component, default_level, format, std::sync::Mutex::new(log_file))
}

/// Log to an arbitrary writer.
///
/// `RUST_LOG` takes precedence over `default_level` when set.
pub fn init_with_writer<W>(
    component: &str,
    default_level: Level,
    format: LogFormat,
    writer: W,
) -> anyhow::Result<()>
where
    W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(component, default_level)));

    match format {
        LogFormat::Json => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .json()
                .with_current_span(true)
                .flatten_event(true);
            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
        LogFormat::Plaintext => {
            let layer = tracing_subscriber::fmt::layer().with_writer(writer);
            #[cfg(debug_assertions)]
            let layer = layer.with_file(true).with_line_number(true);
            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
    }

    Ok(())
}

/// Filter directive applied when `RUST_LOG` is unset.
///
/// Crate targets use underscores, so `conf-rest-server` becomes
/// `conf_rest_server`.
fn default_filter(component: &str, level: Level) -> String {
    format!("{level},{}={level}", component.replace('-', "_"))
}

/// Placeholder for secrets in log fields
pub fn redact(_value: impl std::fmt::Display) -> &'static str {
    "[REDACTED]"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("plaintext".parse::<LogFormat>().unwrap(), LogFormat::Plaintext);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::default().to_string(), "plaintext");
    }

    #[test]
    fn test_cli_log_level_conversion() {
        assert_eq!(Level::from(CliLogLevel::Warn), Level::WARN);
        assert_eq!(Level::from(CliLogLevel::Trace), Level::TRACE);
        assert_eq!(CliLogLevel::default(), CliLogLevel::Info);
        assert_eq!(CliLogLevel::Debug.to_string(), "debug");
    }

    #[test]
    fn test_console_unless_file_options() {
        assert_eq!(CliLoggingArgs::default().log_path("confctl"), None);
    }

    #[test]
    fn test_log_path_resolution() {
        let dir_only = CliLoggingArgs {
            log_dir: Some("/var/log/conf".to_string()),
            ..Default::default()
        };
        assert_eq!(
            dir_only.log_path("conf-rest-server"),
            Some(PathBuf::from("/var/log/conf/conf-rest-server.log"))
        );

        let file_in_dir = CliLoggingArgs {
            log_dir: Some("/var/log/conf".to_string()),
            log_file: Some("server.log".to_string()),
            ..Default::default()
        };
        assert_eq!(
            file_in_dir.log_path("conf-rest-server"),
            Some(PathBuf::from("/var/log/conf/server.log"))
        );

        let absolute = CliLoggingArgs {
            log_dir: Some("/ignored".to_string()),
            log_file: Some("/tmp/server.log".to_string()),
            ..Default::default()
        };
        assert_eq!(
            absolute.log_path("conf-rest-server"),
            Some(PathBuf::from("/tmp/server.log"))
        );

        let bare_name = CliLoggingArgs {
            log_file: Some("server.log".to_string()),
            ..Default::default()
        };
        assert_eq!(
            bare_name.log_path("conf-rest-server"),
            Some(standard_log_dir().join("server.log"))
        );
    }

    #[test]
    fn test_standard_log_path_names_component() {
        let path = standard_log_path("confctl");
        assert!(path.ends_with("confctl.log"));
        assert!(path.to_string_lossy().contains(APP_DIR));
    }

    #[test]
    fn test_default_filter_uses_crate_target() {
        assert_eq!(
            default_filter("conf-rest-server", Level::DEBUG),
            "DEBUG,conf_rest_server=DEBUG"
        );
    }

    #[test]
    fn test_init_to_file_writes_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("test.log");
        init_to_file("conf-logging", Level::INFO, LogFormat::Json, &path).unwrap();
        tracing::info!(registration_id = 7, "scan recorded");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("scan recorded"));
        assert!(contents.contains("\"registration_id\":7"));
    }

    #[test]
    fn test_redact() {
        assert_eq!(redact("jwt-secret"), "[REDACTED]");
    }
}
