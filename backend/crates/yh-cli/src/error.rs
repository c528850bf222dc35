use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;
use yh_config::ConfigError;
use yh_supervisor::SupervisorError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{source}")]
    Config {
        #[source]
        source: ConfigError,
        location: ErrorLocation,
    },

    #[error("{source}")]
    Supervisor {
        #[source]
        source: SupervisorError,
        location: ErrorLocation,
    },

    #[error("Logging setup failed: {message} {location}")]
    Logging {
        message: String,
        location: ErrorLocation,
    },

    #[error("Failed to wait for shutdown signal: {source} {location}")]
    Signal {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("JSON serialization error: {source} {location}")]
    Json {
        #[source]
        source: serde_json::Error,
        location: ErrorLocation,
    },

    #[error("Refusing to reset: {message} {location}")]
    Refused {
        message: String,
        location: ErrorLocation,
    },
}

impl CliError {
    #[track_caller]
    pub fn logging<S: Into<String>>(message: S) -> Self {
        Self::Logging {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn signal(source: std::io::Error) -> Self {
        Self::Signal {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn refused<S: Into<String>>(message: S) -> Self {
        Self::Refused {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Text shown under the error for the person at the terminal.
    pub fn recovery_hint(&self) -> Option<&'static str> {
        match self {
            Self::Config { source, .. } => Some(source.recovery_hint()),
            Self::Supervisor { source, .. } => Some(source.recovery_hint()),
            Self::Refused { .. } => Some("Pass --force to reset while the server is running."),
            Self::Logging { .. } | Self::Signal { .. } | Self::Json { .. } => None,
        }
    }
}

impl From<ConfigError> for CliError {
    #[track_caller]
    fn from(source: ConfigError) -> Self {
        Self::Config {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<SupervisorError> for CliError {
    #[track_caller]
    fn from(source: SupervisorError) -> Self {
        Self::Supervisor {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for CliError {
    #[track_caller]
    fn from(source: serde_json::Error) -> Self {
        Self::Json {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
