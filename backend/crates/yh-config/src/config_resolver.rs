//! Locating the site configuration across packaging layouts.
//!
//! Installers place `config.json` in different spots depending on the
//! platform bundle format, so the resolver walks an ordered list of
//! candidates and returns the first file that exists and parses.

use crate::{
    CONFIG_FILENAME, CONFIG_PATH_ENV, ConfigError, ConfigErrorResult, RESOURCES_DIRECTORY,
    SiteConfig,
};

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ConfigResolver {
    candidates: Vec<PathBuf>,
}

impl ConfigResolver {
    /// Resolver over an explicit, ordered candidate list.
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    /// Resolver for an installed application.
    ///
    /// Search order:
    /// 1. `explicit` (caller-supplied path)
    /// 2. `YOUHOST_CONFIG` env var
    /// 3. `<exe_dir>/config.json`
    /// 4. `<exe_dir>/../config.json`
    /// 5. `<exe_dir>/resources/config.json`
    pub fn with_installation_fallbacks(explicit: Option<PathBuf>) -> Self {
        let mut candidates = Vec::new();

        if let Some(path) = explicit {
            candidates.push(path);
        }

        if let Ok(path) = std::env::var(CONFIG_PATH_ENV)
            && !path.is_empty()
        {
            candidates.push(PathBuf::from(path));
        }

        if let Ok(exe) = std::env::current_exe()
            && let Some(exe_dir) = exe.parent()
        {
            candidates.extend(Self::installation_candidates(exe_dir));
        }

        Self::new(candidates)
    }

    /// Installation-relative fallbacks for a given executable directory.
    pub fn installation_candidates(exe_dir: &Path) -> Vec<PathBuf> {
        vec![
            exe_dir.join(CONFIG_FILENAME),
            exe_dir.join("..").join(CONFIG_FILENAME),
            exe_dir.join(RESOURCES_DIRECTORY).join(CONFIG_FILENAME),
        ]
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Load the first candidate that exists and parses.
    ///
    /// Candidates after the winning one are never touched. A candidate that
    /// exists but cannot be read or parsed is skipped; if no candidate
    /// succeeds, the first such failure is returned, otherwise `NotFound`.
    pub fn load(&self) -> ConfigErrorResult<SiteConfig> {
        let mut first_failure: Option<ConfigError> = None;

        for candidate in &self.candidates {
            debug!("Trying configuration at {}", candidate.display());

            if !candidate.is_file() {
                continue;
            }

            match SiteConfig::from_file(candidate) {
                Ok(config) => {
                    info!("Using configuration at {}", candidate.display());
                    return Ok(config);
                }
                Err(e) => {
                    warn!("Skipping unusable configuration {}: {e}", candidate.display());
                    first_failure.get_or_insert(e);
                }
            }
        }

        Err(first_failure.unwrap_or_else(|| ConfigError::not_found(self.candidates.clone())))
    }
}
