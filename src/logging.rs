//! Diagnostic logging setup.
//!
//! Stdout carries the conversation, so by default logs go to a daily rolling
//! file under [`crate::desk_dirs::logs_dir`]. Failed requests are only ever
//! reported here, never in the transcript.

use crate::error::{DeskError, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "account_desk=info,reqwest=warn,hyper=warn";

/// File name prefix of the rolling log files.
pub const LOG_FILE_PREFIX: &str = "account-desk.log";

/// Where diagnostics are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Standard error.
    Stderr,
    /// Daily rolling files in this directory.
    Directory(PathBuf),
}

impl Default for LogTarget {
    fn default() -> Self {
        Self::Directory(crate::desk_dirs::logs_dir())
    }
}

/// Keeps the background log writer alive; flushes on drop.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _worker: Option<WorkerGuard>,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or a subscriber
/// is already installed.
pub fn init(target: &LogTarget) -> Result<LogGuard> {
    match target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(env_filter())
                .try_init()
                .map_err(|e| DeskError::Config(format!("failed to install logger: {e}")))?;
            Ok(LogGuard { _worker: None })
        }
        LogTarget::Directory(dir) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(dir)?);
            tracing_subscriber::fmt()
                .with_writer(writer)
                .with_ansi(false)
                .with_env_filter(env_filter())
                .try_init()
                .map_err(|e| DeskError::Config(format!("failed to install logger: {e}")))?;
            Ok(LogGuard {
                _worker: Some(guard),
            })
        }
    }
}

fn file_appender(dir: &Path) -> Result<tracing_appender::rolling::RollingFileAppender> {
    std::fs::create_dir_all(dir)?;
    Ok(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn default_target_is_logs_dir() {
        assert_eq!(
            LogTarget::default(),
            LogTarget::Directory(crate::desk_dirs::logs_dir())
        );
    }

    #[test]
    fn file_appender_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("nested").join("logs");
        file_appender(&logs).unwrap();
        assert!(logs.is_dir());
    }
}
