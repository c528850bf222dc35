mod commands;

use yh_config::SupervisorSettings;

use std::path::Path;

/// Settings whose lock file lives in `dir`.
pub(crate) fn settings_in(dir: &Path) -> SupervisorSettings {
    SupervisorSettings {
        lock_file: dir.join("lock.json"),
        ..Default::default()
    }
}
