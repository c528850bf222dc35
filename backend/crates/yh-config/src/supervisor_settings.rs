//! Runtime settings for the supervisor itself (not the supervised site).

use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_LOCK_FILENAME, DEFAULT_LOG_LEVEL, DEFAULT_SETTLE_DELAY,
    LogLevel, MAX_SETTLE_DELAY, SETTINGS_APP_DIRECTORY, SETTINGS_DIR_ENV, SETTINGS_FILENAME,
};

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SupervisorSettings {
    /// Wait after spawning before the server is assumed ready.
    #[serde(deserialize_with = "deserialize_duration")]
    pub settle_delay: Duration,
    /// Shared lock record. Every cooperating process on the host must agree on it.
    pub lock_file: PathBuf,
    pub log_level: LogLevel,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            lock_file: std::env::temp_dir().join(DEFAULT_LOCK_FILENAME),
            log_level: LogLevel(DEFAULT_LOG_LEVEL),
        }
    }
}

impl SupervisorSettings {
    /// Load settings.
    ///
    /// Loading order:
    /// 1. Resolve the settings directory (`YOUHOST_SETTINGS_DIR`, else the
    ///    platform config dir + `youhost/`)
    /// 2. Load `youhost.toml` if it exists, else use defaults
    /// 3. Apply `YOUHOST_*` environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let path = Self::settings_dir()?.join(SETTINGS_FILENAME);

        let mut settings = if path.is_file() {
            Self::load_toml(&path)?
        } else {
            Self::default()
        };

        settings.apply_env_overrides();

        Ok(settings)
    }

    /// Load and parse a TOML settings file.
    pub fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the settings directory.
    /// Priority: YOUHOST_SETTINGS_DIR env var > <platform config dir>/youhost
    pub fn settings_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(SETTINGS_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        dirs::config_dir()
            .map(|dir| dir.join(SETTINGS_APP_DIRECTORY))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.settle_delay > MAX_SETTLE_DELAY {
            return Err(ConfigError::settings(format!(
                "settle_delay must be at most {}, got {}",
                humantime::format_duration(MAX_SETTLE_DELAY),
                humantime::format_duration(self.settle_delay)
            )));
        }

        if self.lock_file.as_os_str().is_empty() {
            return Err(ConfigError::settings("lock_file must not be empty"));
        }

        Ok(())
    }

    pub fn log_summary(&self) {
        info!("Supervisor settings:");
        info!("  settle_delay: {}", humantime::format_duration(self.settle_delay));
        info!("  lock_file: {}", self.lock_file.display());
        info!("  log_level: {}", *self.log_level);
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("YOUHOST_SETTLE_DELAY") {
            match humantime::parse_duration(&val) {
                Ok(delay) => self.settle_delay = delay,
                Err(e) => warn!("Ignoring YOUHOST_SETTLE_DELAY={val}: {e}"),
            }
        }

        if let Ok(val) = std::env::var("YOUHOST_LOCK_FILE")
            && !val.is_empty()
        {
            self.lock_file = PathBuf::from(val);
        }

        Self::apply_env_parse("YOUHOST_LOG_LEVEL", &mut self.log_level);
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    humantime::parse_duration(&text).map_err(serde::de::Error::custom)
}
