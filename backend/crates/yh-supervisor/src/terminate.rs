//! Terminating the supervised process together with everything it spawned.
//!
//! Dev servers are usually launched through a shell and a package runner,
//! so killing only the top pid would orphan the actual server. Each
//! platform gets one strategy that reaches the whole tree.

use crate::SupervisorResult;

use std::fmt::Debug;
use std::sync::Arc;

#[cfg(unix)]
use crate::SupervisorError;
#[cfg(unix)]
use nix::sys::signal::{Signal, killpg};
#[cfg(unix)]
use nix::unistd::Pid;
#[cfg(unix)]
use tracing::{debug, info};

/// Terminates a process tree rooted at a pid.
pub trait TreeTerminator: Send + Sync + Debug {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Terminate the tree rooted at `pid`. A tree that is already gone is
    /// not an error.
    fn terminate_tree(&self, pid: u32) -> SupervisorResult<()>;
}

/// The strategy for the current platform.
pub fn platform_terminator() -> Arc<dyn TreeTerminator> {
    #[cfg(unix)]
    {
        Arc::new(ProcessGroupSignal::default())
    }

    #[cfg(windows)]
    {
        Arc::new(TaskKillTree)
    }
}

/// Signal the process group led by the spawned shell.
///
/// The server is spawned as a session leader (`setsid`), so its pid is also
/// its process group id and `killpg` reaches every descendant that has not
/// moved to a group of its own.
#[cfg(unix)]
#[derive(Debug, Clone, Copy)]
pub struct ProcessGroupSignal {
    signal: Signal,
}

#[cfg(unix)]
impl ProcessGroupSignal {
    pub fn new(signal: Signal) -> Self {
        Self { signal }
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }
}

/// SIGINT, the same thing a terminal Ctrl-C delivers, which dev servers
/// handle by shutting down cleanly.
#[cfg(unix)]
impl Default for ProcessGroupSignal {
    fn default() -> Self {
        Self::new(Signal::SIGINT)
    }
}

#[cfg(unix)]
impl TreeTerminator for ProcessGroupSignal {
    fn name(&self) -> &'static str {
        "process-group-signal"
    }

    fn terminate_tree(&self, pid: u32) -> SupervisorResult<()> {
        let raw = i32::try_from(pid)
            .map_err(|_| SupervisorError::termination(pid, "pid out of range"))?;

        info!("Sending {} to process group {pid}", self.signal);

        match killpg(Pid::from_raw(raw), self.signal) {
            Ok(()) => Ok(()),
            Err(nix::errno::Errno::ESRCH) => {
                debug!("Process group {pid} already exited");
                Ok(())
            }
            Err(errno) => Err(SupervisorError::termination(pid, errno.desc())),
        }
    }
}

/// `taskkill /PID <pid> /T /F`: forceful kill of the pid and its children.
#[cfg(windows)]
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskKillTree;

#[cfg(windows)]
impl TreeTerminator for TaskKillTree {
    fn name(&self) -> &'static str {
        "taskkill-tree"
    }

    fn terminate_tree(&self, pid: u32) -> SupervisorResult<()> {
        use crate::SupervisorError;
        use tracing::info;

        // taskkill reports "not found" (exit code 128) for an already exited tree
        const TASKKILL_NOT_FOUND: i32 = 128;

        info!("Running taskkill on process tree {pid}");

        let output = std::process::Command::new("taskkill")
            .args(["/PID", &pid.to_string(), "/T", "/F"])
            .output()
            .map_err(|e| SupervisorError::termination(pid, e.to_string()))?;

        match output.status.code() {
            Some(0) | Some(TASKKILL_NOT_FOUND) => Ok(()),
            _ => Err(SupervisorError::termination(
                pid,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            )),
        }
    }
}
