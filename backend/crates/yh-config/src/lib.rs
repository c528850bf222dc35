mod config_resolver;
mod error;
mod log_level;
mod site_config;
mod supervisor_settings;
mod template_params;

#[cfg(test)]
mod tests;

pub use config_resolver::ConfigResolver;
pub use error::{ConfigError, ConfigErrorResult};
pub use log_level::LogLevel;
pub use site_config::SiteConfig;
pub use supervisor_settings::SupervisorSettings;
pub use template_params::TemplateParams;

use std::time::Duration;

const CONFIG_FILENAME: &str = "config.json";
const RESOURCES_DIRECTORY: &str = "resources";
const CONFIG_PATH_ENV: &str = "YOUHOST_CONFIG";

const SETTINGS_FILENAME: &str = "youhost.toml";
const SETTINGS_DIR_ENV: &str = "YOUHOST_SETTINGS_DIR";
const SETTINGS_APP_DIRECTORY: &str = "youhost";

const DEFAULT_LOCK_FILENAME: &str = "youhost-server-lock.json";
const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(10);
const MAX_SETTLE_DELAY: Duration = Duration::from_secs(600);
const DEFAULT_LOG_LEVEL_STRING: &str = "info";
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
