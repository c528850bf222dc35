use std::panic::Location;
use std::path::PathBuf;
use std::result::Result as StdResult;

use error_location::ErrorLocation;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum ConfigError {
    #[error("{category} error: {message} {location}")]
    Generic {
        category: &'static str,
        message: String,
        location: ErrorLocation,
    },

    #[error("No configuration file found (tried: {}) {location}", display_paths(.candidates))]
    NotFound {
        candidates: Vec<PathBuf>,
        location: ErrorLocation,
    },

    #[error("Malformed configuration in {path}: {message} {location}")]
    Malformed {
        path: PathBuf,
        message: String,
        location: ErrorLocation,
    },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Platform configuration directory not found")]
    NoConfigDir,
}

impl ConfigError {
    /// Create a config validation error
    #[track_caller]
    pub fn config<S: Into<String>>(message: S) -> Self {
        ConfigError::Generic {
            category: "Config",
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Create a settings error
    #[track_caller]
    pub fn settings<S: Into<String>>(message: S) -> Self {
        ConfigError::Generic {
            category: "Settings",
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn not_found(candidates: Vec<PathBuf>) -> Self {
        ConfigError::NotFound {
            candidates,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn malformed<S: Into<String>>(path: PathBuf, message: S) -> Self {
        ConfigError::Malformed {
            path,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// True for the "nothing usable was found" case, as opposed to a file
    /// that was found but could not be used.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => {
                "No config.json was found next to the application. \
                   Reinstall the application or pass --config explicitly."
            }
            Self::Malformed { .. } => {
                "config.json is not valid. Check mainURL, sourceDirectory and \
                   commandTemplate, or regenerate it with the configurator."
            }
            Self::Io { .. } => "Unable to read the configuration file. Check file permissions.",
            Self::Toml { .. } => "youhost.toml contains invalid TOML. Fix or delete it.",
            Self::NoConfigDir => "Set YOUHOST_SETTINGS_DIR to a writable directory.",
            Self::Generic { .. } => "Configuration has invalid settings. Check the logs for details.",
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type ConfigErrorResult<T> = StdResult<T, ConfigError>;
