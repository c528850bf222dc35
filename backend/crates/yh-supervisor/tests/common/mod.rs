#![allow(dead_code)]

use yh_config::ConfigResolver;
use yh_supervisor::{
    LockFileCoordinator, ProcessSupervisor, SupervisorError, SupervisorResult, TreeTerminator,
    is_process_running,
};

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

/// Settle delay used by tests that expect the server to come up.
pub const TEST_SETTLE_DELAY: Duration = Duration::from_millis(300);

/// Port embedded in the test site's URL.
pub const TEST_PORT: u16 = 9417;

/// A throwaway site: config file, source directory and lock file, all
/// inside one temp directory.
pub struct TestSite {
    pub temp: TempDir,
    pub config_path: PathBuf,
    pub source_dir: PathBuf,
    pub lock_path: PathBuf,
}

impl TestSite {
    pub fn new(command: &str) -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let source_dir = temp.path().join("site");
        std::fs::create_dir(&source_dir).expect("Failed to create source dir");
        Self::with_source_dir(temp, source_dir, command)
    }

    /// Site whose configured source directory does not exist.
    pub fn with_missing_source_dir(command: &str) -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let source_dir = temp.path().join("missing");
        Self::with_source_dir(temp, source_dir, command)
    }

    fn with_source_dir(temp: TempDir, source_dir: PathBuf, command: &str) -> Self {
        let config_path = temp.path().join("config.json");
        let lock_path = temp.path().join("youhost-server-lock.json");

        let json = serde_json::json!({
            "mainURL": format!("http://localhost:{TEST_PORT}"),
            "sourceDirectory": source_dir,
            "commandTemplate": command,
            "templateParameters": { "greeting": "hello" }
        });
        std::fs::write(&config_path, serde_json::to_vec_pretty(&json).unwrap())
            .expect("Failed to write config");

        Self {
            temp,
            config_path,
            source_dir,
            lock_path,
        }
    }

    pub fn coordinator(&self) -> LockFileCoordinator {
        LockFileCoordinator::new(&self.lock_path)
    }

    pub fn supervisor(&self) -> ProcessSupervisor {
        self.supervisor_with_delay(TEST_SETTLE_DELAY)
    }

    pub fn supervisor_with_delay(&self, settle_delay: Duration) -> ProcessSupervisor {
        ProcessSupervisor::new(
            ConfigResolver::new(vec![self.config_path.clone()]),
            self.coordinator(),
            settle_delay,
        )
    }

    pub fn source_file(&self, name: &str) -> PathBuf {
        self.source_dir.join(name)
    }

    pub fn ref_count(&self) -> u32 {
        self.coordinator()
            .read()
            .expect("Failed to read lock record")
            .map(|r| r.count)
            .unwrap_or(0)
    }
}

/// Tree terminator that always fails and leaves the process alone.
#[derive(Debug)]
pub struct FailingTerminator;

impl TreeTerminator for FailingTerminator {
    fn name(&self) -> &'static str {
        "failing terminator"
    }

    fn terminate_tree(&self, pid: u32) -> SupervisorResult<()> {
        Err(SupervisorError::termination(pid, "terminator refused"))
    }
}

/// Poll until `pid` is gone. Yields to the runtime between polls so the
/// exit observer can reap the child.
pub async fn wait_until_dead(pid: u32) -> bool {
    for _ in 0..100 {
        if !is_process_running(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

/// Poll until `path` exists.
pub async fn wait_for_file(path: &Path) -> bool {
    for _ in 0..100 {
        if path.is_file() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
