//! The site configuration describing which server to supervise.

use crate::{ConfigError, ConfigErrorResult, TemplateParams};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration produced by the configurator and shipped next to the app.
///
/// Field names follow the on-disk JSON; the older `siteFiles`,
/// `startTrigger` and `triggerParams` spellings are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// URL the supervised server answers on. Also the source of `[port]`.
    #[serde(rename = "mainURL")]
    pub main_url: Url,

    /// Working directory the command runs in.
    #[serde(rename = "sourceDirectory", alias = "siteFiles")]
    pub source_directory: PathBuf,

    /// Command line with `[placeholder]` tokens.
    #[serde(rename = "commandTemplate", alias = "startTrigger")]
    pub command_template: String,

    #[serde(
        rename = "templateParameters",
        alias = "triggerParams",
        default,
        skip_serializing_if = "TemplateParams::is_empty"
    )]
    pub template_parameters: TemplateParams,

    /// File this configuration was loaded from, if any.
    #[serde(skip)]
    pub origin: Option<PathBuf>,
}

impl SiteConfig {
    /// Parse a configuration from JSON text.
    ///
    /// `path` is only used for error context and for resolving a relative
    /// `sourceDirectory` against the file's own directory.
    pub fn from_json(path: &Path, contents: &str) -> ConfigErrorResult<Self> {
        let mut config: SiteConfig = serde_json::from_str(contents)
            .map_err(|e| ConfigError::malformed(path.to_path_buf(), e.to_string()))?;

        config
            .validate()
            .map_err(|e| ConfigError::malformed(path.to_path_buf(), e.to_string()))?;

        if config.source_directory.is_relative()
            && let Some(base) = path.parent()
        {
            config.source_directory = base.join(&config.source_directory);
        }

        config.origin = Some(path.to_path_buf());
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn from_file(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_json(path, &contents)
    }

    /// Structural checks that do not touch the filesystem.
    ///
    /// Whether `source_directory` exists is checked by the supervisor at
    /// start time, not here, because the directory may be created between
    /// loading and starting.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.command_template.trim().is_empty() {
            return Err(ConfigError::config("commandTemplate must not be empty"));
        }

        if self.source_directory.as_os_str().is_empty() {
            return Err(ConfigError::config("sourceDirectory must not be empty"));
        }

        if self.main_url.cannot_be_a_base() {
            return Err(ConfigError::config(format!(
                "mainURL must be an absolute URL, got '{}'",
                self.main_url
            )));
        }

        Ok(())
    }

    /// Log configuration summary.
    pub fn log_summary(&self) {
        log::info!("Site configuration loaded:");
        if let Some(origin) = &self.origin {
            log::info!("  file: {}", origin.display());
        }
        log::info!("  mainURL: {}", self.main_url);
        log::info!("  sourceDirectory: {}", self.source_directory.display());
        log::info!("  commandTemplate: {}", self.command_template);
        log::info!("  templateParameters: {} entries", self.template_parameters.len());
    }
}
