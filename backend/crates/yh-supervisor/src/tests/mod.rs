mod template;

use crate::LockFileCoordinator;

use tempfile::TempDir;

/// Coordinator over a fresh lock file in its own temp directory.
pub(crate) fn temp_coordinator() -> (TempDir, LockFileCoordinator) {
    let temp = TempDir::new().unwrap();
    let coordinator = LockFileCoordinator::new(temp.path().join("lock.json"));
    (temp, coordinator)
}

/// A pid that is guaranteed not to name a live process.
pub(crate) fn dead_pid() -> u32 {
    let mut child = std::process::Command::new(if cfg!(windows) { "cmd" } else { "true" })
        .args(if cfg!(windows) { &["/C", "exit"][..] } else { &[][..] })
        .spawn()
        .unwrap();
    let pid = child.id();
    child.wait().unwrap();
    pid
}
