//! Logging setup with file rotation.

use crate::{APP_DIRECTORY, CliError, CliResult, LOG_FILE_PREFIX, LOG_FILES_RETAINED};

use std::path::{Path, PathBuf};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt};
use yh_config::LogLevel;

/// Install the global subscriber.
///
/// # Log Layers
/// - Console: human-readable, on stderr so stdout stays clean for JSON
/// - File: daily rotation under `<logs_dir>`, 7 files kept (skipped if
///   `logs_dir` is `None`)
///
/// `RUST_LOG` wins over `level`. Records from crates using the `log` facade
/// are bridged in.
pub fn setup_logging(logs_dir: Option<&Path>, level: &LogLevel) -> CliResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);

    let file_layer = match logs_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| {
                CliError::logging(format!("cannot create {}: {e}", dir.display()))
            })?;

            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(LOG_FILES_RETAINED)
                .filename_prefix(LOG_FILE_PREFIX)
                .filename_suffix("log")
                .build(dir)
                .map_err(|e| CliError::logging(e.to_string()))?;

            Some(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(false)
                    .with_writer(appender),
            )
        }
        None => None,
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| CliError::logging(e.to_string()))?;

    tracing_log::LogTracer::init().map_err(|e| CliError::logging(e.to_string()))?;

    Ok(())
}

/// `<data_local_dir>/youhost/logs`, if the platform has such a directory.
pub fn default_logs_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join(APP_DIRECTORY).join("logs"))
}
