//! Logging setup for the command line tool
//!
//! Initializes a `tracing-subscriber` writing to stderr, or appending to a
//! file when one is configured.
//!
//! ## Filter priority
//!
//! 1. `RUST_LOG` environment variable (highest)
//! 2. `[logging] level` from the configuration file
//! 3. Default: `metastore_catalog=info`

use std::fs::{File, OpenOptions};
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, time::SystemTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::{DEFAULT_LOG_LEVEL, LoggingSection};

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Logging options resolved from configuration and flags
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Log level: "off", "error", "warn", "info", "debug", "trace"
    pub level: Option<String>,
    /// Log file path. If unset, logs go to stderr.
    pub file: Option<String>,
}

impl From<&LoggingSection> for LogConfig {
    fn from(section: &LoggingSection) -> Self {
        Self {
            level: Some(section.level.clone()),
            file: section.file.clone(),
        }
    }
}

impl LogConfig {
    /// Filter directive for this crate
    pub fn directive(&self) -> String {
        let level = self
            .level
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LOG_LEVEL);
        format!("metastore_catalog={}", level.to_lowercase())
    }

    fn is_off(&self) -> bool {
        self.level
            .as_deref()
            .is_some_and(|l| l.eq_ignore_ascii_case("off"))
    }
}

/// Initialize the tracing subscriber.
///
/// Called at most once per process; later calls are no-ops. A log file that
/// cannot be opened falls back to stderr.
pub fn init_logging(config: &LogConfig) {
    LOGGING_INITIALIZED.get_or_init(|| {
        if config.is_off() {
            return;
        }

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directive()));

        if let Some(file) = open_log_file(config) {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .with_timer(SystemTime),
                )
                .try_init()
                .ok();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                        .with_timer(SystemTime),
                )
                .try_init()
                .ok();
        }
    });
}

/// Open the configured log file for appending
///
/// `None` when no file is configured or it cannot be opened.
fn open_log_file(config: &LogConfig) -> Option<File> {
    let path = config.file.as_ref()?;
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!(
                "metastore-catalog: failed to open log file {}: {}, logging to stderr",
                path, e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(LogConfig::default().directive(), "metastore_catalog=info");
    }

    #[test]
    fn test_directive_from_section() {
        let section = LoggingSection {
            level: "DEBUG".to_string(),
            file: Some("/tmp/catalog.log".to_string()),
        };
        let config = LogConfig::from(&section);
        assert_eq!(config.directive(), "metastore_catalog=debug");
        assert_eq!(config.file.as_deref(), Some("/tmp/catalog.log"));
        assert!(!config.is_off());
    }

    #[test]
    fn test_off_level() {
        let config = LogConfig {
            level: Some("OFF".to_string()),
            file: None,
        };
        assert!(config.is_off());
    }

    #[test]
    fn test_log_file_opened_for_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.log");
        std::fs::write(&path, "earlier run\n").unwrap();
        let config = LogConfig {
            level: None,
            file: Some(path.to_string_lossy().to_string()),
        };

        let mut file = open_log_file(&config).unwrap();
        std::io::Write::write_all(&mut file, b"this run\n").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "earlier run\nthis run\n"
        );
    }

    #[test]
    fn test_unopenable_log_file_falls_back_to_stderr() {
        let config = LogConfig {
            level: Some("info".to_string()),
            file: Some("/nonexistent-dir/x/catalog.log".to_string()),
        };
        assert!(open_log_file(&config).is_none());

        init_logging(&config);
        assert!(tracing::dispatcher::has_been_set());
    }

    #[test]
    fn test_no_log_file_configured() {
        assert!(open_log_file(&LogConfig::default()).is_none());
    }
}
