//! The server process owned by the supervisor that spawned it.

use crate::{
    LockFileCoordinator, ProcessState, SERVER_LOG_TARGET, SupervisorError, SupervisorResult,
    TAIL_POLL_INTERVAL, TreeTerminator,
};

use std::fs::{File, OpenOptions};
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use error_location::ErrorLocation;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Handle to a spawned server.
///
/// The OS child handle itself lives in the exit observer task; this struct
/// keeps the pid, the published state, and the termination strategy chosen
/// at spawn time.
///
/// The server writes stdout and stderr to a log file rather than to pipes,
/// so it keeps running after the spawning process exits. The spawner tails
/// that file into tracing for as long as it holds this handle.
#[derive(Debug)]
pub(crate) struct SupervisedProcess {
    pid: u32,
    state_tx: Arc<watch::Sender<ProcessState>>,
    state_rx: watch::Receiver<ProcessState>,
    stop_requested: Arc<AtomicBool>,
    terminator: Arc<dyn TreeTerminator>,
    tail: JoinHandle<()>,
}

impl SupervisedProcess {
    /// Spawn `command` through the platform shell in `working_dir`.
    ///
    /// The child is detached into its own session / process group so it
    /// survives the supervisor's parent, its output goes to `output_log`
    /// (truncated first), and an observer task watches for exit.
    pub(crate) fn spawn(
        command: &str,
        working_dir: &Path,
        output_log: &Path,
        coordinator: LockFileCoordinator,
        terminator: Arc<dyn TreeTerminator>,
    ) -> SupervisorResult<Self> {
        info!(
            "Spawning server in {}: {command}",
            working_dir.display()
        );

        let spawn_error = |source: std::io::Error| SupervisorError::SpawnFailure {
            command: command.to_string(),
            source,
            location: ErrorLocation::from(Location::caller()),
        };

        let stdout = Self::open_output_log(output_log).map_err(spawn_error)?;
        let stderr = stdout.try_clone().map_err(spawn_error)?;

        let mut cmd = Self::shell_command(command);
        cmd.current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(false);

        Self::detach(&mut cmd);

        let child = cmd.spawn().map_err(spawn_error)?;

        let pid = child.id().ok_or_else(|| {
            spawn_error(std::io::Error::other(
                "child exited before its pid could be read",
            ))
        })?;

        info!(
            pid,
            "Server process spawned with {}, output in {}",
            terminator.name(),
            output_log.display()
        );

        let (state_tx, state_rx) = watch::channel(ProcessState::Starting);
        let state_tx = Arc::new(state_tx);
        let stop_requested = Arc::new(AtomicBool::new(false));

        let tail = Self::tail_output(output_log.to_path_buf(), pid, state_rx.clone());

        Self::observe_exit(
            child,
            pid,
            coordinator,
            state_tx.clone(),
            stop_requested.clone(),
        );

        Ok(Self {
            pid,
            state_tx,
            state_rx,
            stop_requested,
            terminator,
            tail,
        })
    }

    pub(crate) fn pid(&self) -> u32 {
        self.pid
    }

    pub(crate) fn state(&self) -> ProcessState {
        *self.state_rx.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ProcessState> {
        self.state_rx.clone()
    }

    /// Promote `Starting` to `Running` once the settle delay has passed.
    pub(crate) fn mark_running(&self) {
        self.state_tx.send_if_modified(|state| {
            if *state == ProcessState::Starting {
                *state = ProcessState::Running;
                true
            } else {
                false
            }
        });
    }

    /// Resolve once the process has exited, with its exit code.
    pub(crate) async fn exited(&self) -> Option<i32> {
        let mut rx = self.state_rx.clone();
        match rx.wait_for(ProcessState::is_stopped).await {
            Ok(state) => match *state {
                ProcessState::Stopped { exit_code } => exit_code,
                _ => None,
            },
            Err(_) => None,
        }
    }

    /// Wait (bounded) for the output tail to forward everything the exited
    /// process wrote.
    pub(crate) async fn drain_output(&mut self) {
        if tokio::time::timeout(OUTPUT_DRAIN_TIMEOUT, &mut self.tail)
            .await
            .is_err()
        {
            debug!(pid = self.pid, "Gave up waiting for server output");
        }
    }

    /// Terminate the process tree. Exits after this call are expected and
    /// do not touch the lock record.
    pub(crate) fn terminate(&self) -> SupervisorResult<()> {
        self.stop_requested.store(true, Ordering::SeqCst);

        if self.state().is_stopped() {
            debug!(pid = self.pid, "Server process already exited");
            return Ok(());
        }

        self.terminator.terminate_tree(self.pid)
    }

    #[cfg(unix)]
    fn shell_command(command: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }

    #[cfg(windows)]
    fn shell_command(command: &str) -> Command {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").raw_arg(command);
        cmd
    }

    /// Put the child in a new session so it outlives the supervisor and can
    /// be signalled as a group.
    #[cfg(unix)]
    fn detach(cmd: &mut Command) {
        // SAFETY: setsid() is async-signal-safe and only affects the child
        // between fork and exec.
        unsafe {
            cmd.pre_exec(|| {
                if libc::setsid() == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }
    }

    #[cfg(windows)]
    fn detach(cmd: &mut Command) {
        use windows_sys::Win32::System::Threading::CREATE_NEW_PROCESS_GROUP;

        cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
    }

    fn open_output_log(path: &Path) -> std::io::Result<File> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)?;
        }

        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
    }

    /// Follow the output log and forward each line to the diagnostic sink.
    ///
    /// Stops after the process has exited and the file has been read to the
    /// end once more.
    fn tail_output(
        path: PathBuf,
        pid: u32,
        state_rx: watch::Receiver<ProcessState>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let file = match tokio::fs::File::open(&path).await {
                Ok(file) => file,
                Err(e) => {
                    warn!(pid, "Cannot follow server output {}: {e}", path.display());
                    return;
                }
            };

            let mut reader = BufReader::new(file);
            let mut buf = Vec::new();
            let mut exit_seen = false;

            loop {
                match reader.read_until(b'\n', &mut buf).await {
                    Ok(0) => {
                        if exit_seen {
                            Self::emit_line(pid, &buf);
                            break;
                        }
                        if state_rx.borrow().is_stopped() {
                            exit_seen = true;
                            continue;
                        }
                        tokio::time::sleep(TAIL_POLL_INTERVAL).await;
                    }
                    Ok(_) if buf.ends_with(b"\n") => {
                        Self::emit_line(pid, &buf);
                        buf.clear();
                    }
                    // Partial line at end of file, wait for the rest
                    Ok(_) => {}
                    Err(e) => {
                        debug!(pid, "Server output log unreadable: {e}");
                        break;
                    }
                }
            }
        })
    }

    fn emit_line(pid: u32, bytes: &[u8]) {
        let line = String::from_utf8_lossy(bytes);
        let line = line.trim_end();
        if !line.is_empty() {
            info!(target: SERVER_LOG_TARGET, pid, "{line}");
        }
    }

    /// Wait for the child in the background. An exit nobody asked for
    /// clears the shared running flag so the next start can respawn.
    fn observe_exit(
        mut child: Child,
        pid: u32,
        coordinator: LockFileCoordinator,
        state_tx: Arc<watch::Sender<ProcessState>>,
        stop_requested: Arc<AtomicBool>,
    ) {
        tokio::spawn(async move {
            let exit_code = match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    error!(pid, "Failed to wait for server process: {e}");
                    None
                }
            };

            if stop_requested.load(Ordering::SeqCst) {
                info!(pid, ?exit_code, "Server process exited after stop request");
            } else {
                warn!(pid, ?exit_code, "Server process exited unexpectedly");
                if let Err(e) = coordinator.mark_stopped(Some(pid)) {
                    error!(pid, "Failed to mark server as stopped in lock record: {e}");
                }
            }

            state_tx.send_replace(ProcessState::Stopped { exit_code });
        });
    }
}

impl Drop for SupervisedProcess {
    fn drop(&mut self) {
        self.tail.abort();
    }
}
