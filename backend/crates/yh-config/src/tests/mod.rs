mod template_params;

use std::env;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// RAII guard for environment variables - automatically restores on drop
pub(crate) struct EnvGuard {
    key: &'static str,
    original: Option<String>,
}

impl EnvGuard {
    pub(crate) fn set(key: &'static str, value: &str) -> Self {
        unsafe {
            let original = env::var(key).ok();
            env::set_var(key, value);
            Self { key, original }
        }
    }

    pub(crate) fn remove(key: &'static str) -> Self {
        unsafe {
            let original = env::var(key).ok();
            env::remove_var(key);
            Self { key, original }
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        unsafe {
            match &self.original {
                Some(val) => env::set_var(self.key, val),
                None => env::remove_var(self.key),
            }
        }
    }
}

/// Create a temp settings directory and point YOUHOST_SETTINGS_DIR at it
pub(crate) fn setup_settings_dir() -> (TempDir, EnvGuard) {
    let temp = TempDir::new().unwrap();
    let guard = EnvGuard::set("YOUHOST_SETTINGS_DIR", temp.path().to_str().unwrap());
    (temp, guard)
}

/// Write a site config whose sourceDirectory is the temp dir itself.
pub(crate) fn write_site_config(dir: &Path, file_name: &str, command: &str) -> PathBuf {
    let path = dir.join(file_name);
    let json = serde_json::json!({
        "mainURL": "http://localhost:9000",
        "sourceDirectory": dir.to_str().unwrap(),
        "commandTemplate": command,
        "templateParameters": { "env": "prod" }
    });
    std::fs::write(&path, serde_json::to_string_pretty(&json).unwrap()).unwrap();
    path
}
