use std::panic::Location;
use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;
use yh_config::ConfigError;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Configuration error: {source} {location}")]
    Config {
        #[source]
        source: ConfigError,
        location: ErrorLocation,
    },

    #[error("Source directory not found at {path} {location}")]
    DirectoryNotFound {
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("Lock record I/O failed at {path}: {source} {location}")]
    LockIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Failed to spawn server command `{command}`: {source} {location}")]
    SpawnFailure {
        command: String,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Server process exited during startup with code {code:?} {location}")]
    EarlyExit {
        code: Option<i32>,
        location: ErrorLocation,
    },

    #[error("Failed to terminate process tree {pid}: {message} {location}")]
    TerminationFailure {
        pid: u32,
        message: String,
        location: ErrorLocation,
    },

    #[error("This supervisor already holds a server reference {location}")]
    AlreadyStarted { location: ErrorLocation },
}

impl SupervisorError {
    #[track_caller]
    pub fn lock_io(path: PathBuf, source: std::io::Error) -> Self {
        Self::LockIo {
            path,
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn termination<S: Into<String>>(pid: u32, message: S) -> Self {
        Self::TerminationFailure {
            pid,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Whether this error is recoverable via retry
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::LockIo { .. } | Self::EarlyExit { .. })
    }

    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::Config { source, .. } => source.recovery_hint(),
            Self::DirectoryNotFound { .. } => {
                "The site's source directory is missing. \
                   Re-run the configurator or restore the project files."
            }
            Self::LockIo { .. } => {
                "Unable to read or write the shared lock record. \
                   Check permissions and free space in the temp directory."
            }
            Self::SpawnFailure { .. } => {
                "The server command could not be started. \
                   Check that the command and its tools are installed."
            }
            Self::EarlyExit { .. } => {
                "The server exited while starting. \
                   Check the logs for the server's own error output."
            }
            Self::TerminationFailure { .. } => {
                "The server could not be stopped. \
                   It may need to be ended from the task manager."
            }
            Self::AlreadyStarted { .. } => "The server is already started for this window.",
        }
    }
}

impl From<ConfigError> for SupervisorError {
    #[track_caller]
    fn from(source: ConfigError) -> Self {
        Self::Config {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
