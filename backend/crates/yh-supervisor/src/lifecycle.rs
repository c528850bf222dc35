//! Server process lifecycle shared across application instances.

use crate::process::SupervisedProcess;
use crate::{
    CommandTemplateEngine, LockFileCoordinator, ProcessState, StartOutcome, StopOutcome,
    SupervisorError, SupervisorResult, SupervisorState, TreeTerminator, is_process_running,
    platform_terminator,
};

use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use error_location::ErrorLocation;
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, warn};
use yh_config::{ConfigResolver, SiteConfig, SupervisorSettings};

/// One logical consumer of the shared server.
///
/// Responsibilities:
/// - Resolve the site configuration on every start
/// - Take a reference in the shared lock record
/// - Spawn the server if this consumer is the first one
/// - Release the reference on stop, terminating the server if last out
///
/// `start()` and `stop()` are serialized per supervisor: a `stop()` issued
/// while a `start()` is settling waits for the start to finish.
pub struct ProcessSupervisor {
    resolver: ConfigResolver,
    coordinator: LockFileCoordinator,
    settle_delay: Duration,
    terminator: Arc<dyn TreeTerminator>,
    state_tx: watch::Sender<SupervisorState>,
    state_rx: watch::Receiver<SupervisorState>,
    lease: Mutex<Lease>,
}

#[derive(Debug, Default)]
struct Lease {
    held: bool,
    process: Option<SupervisedProcess>,
    config: Option<SiteConfig>,
}

impl ProcessSupervisor {
    /// Create a supervisor using the platform's tree termination strategy.
    pub fn new(
        resolver: ConfigResolver,
        coordinator: LockFileCoordinator,
        settle_delay: Duration,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(SupervisorState::Idle);

        Self {
            resolver,
            coordinator,
            settle_delay,
            terminator: platform_terminator(),
            state_tx,
            state_rx,
            lease: Mutex::new(Lease::default()),
        }
    }

    pub fn from_settings(resolver: ConfigResolver, settings: &SupervisorSettings) -> Self {
        Self::new(
            resolver,
            LockFileCoordinator::new(&settings.lock_file),
            settings.settle_delay,
        )
    }

    /// Replace the tree termination strategy used for processes spawned
    /// from now on.
    pub fn with_terminator(mut self, terminator: Arc<dyn TreeTerminator>) -> Self {
        self.terminator = terminator;
        self
    }

    pub fn coordinator(&self) -> &LockFileCoordinator {
        &self.coordinator
    }

    /// Start (or join) the shared server.
    ///
    /// Configuration and directory errors are reported before the lock is
    /// touched. A spawn failure or an exit during the settle delay gives the
    /// reference back before returning.
    pub async fn start(&self) -> SupervisorResult<StartOutcome> {
        let mut lease = self.lease.lock().await;

        if lease.held {
            return Err(SupervisorError::AlreadyStarted {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.set_state(SupervisorState::Starting);

        match self.start_locked(&mut lease).await {
            Ok(outcome) => {
                self.set_state(SupervisorState::Active);
                Ok(outcome)
            }
            Err(e) => {
                error!("Server start failed: {e}");
                self.set_state(SupervisorState::Stopped);
                Err(e)
            }
        }
    }

    async fn start_locked(&self, lease: &mut Lease) -> SupervisorResult<StartOutcome> {
        let config = self.resolver.load()?;
        config.log_summary();

        if !config.source_directory.is_dir() {
            return Err(SupervisorError::DirectoryNotFound {
                path: config.source_directory.clone(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let acquisition = self.coordinator.acquire()?;
        lease.held = true;

        if acquisition.was_running {
            info!(
                "Server already running, joined as one of {} consumers",
                acquisition.count
            );
            lease.config = Some(config);
            return Ok(StartOutcome::Joined {
                count: acquisition.count,
            });
        }

        let expansion = CommandTemplateEngine::expand(
            &config.command_template,
            &config.template_parameters,
            &config.main_url,
        );

        let mut process = match SupervisedProcess::spawn(
            &expansion.command,
            &config.source_directory,
            &self.coordinator.server_log_path(),
            self.coordinator.clone(),
            self.terminator.clone(),
        ) {
            Ok(process) => process,
            Err(e) => {
                self.give_back(lease);
                return Err(e);
            }
        };

        let pid = process.pid();

        if let Err(e) = self.coordinator.record_pid(pid) {
            if let Err(kill_err) = process.terminate() {
                warn!("Failed to terminate server after lock error: {kill_err}");
            }
            self.give_back(lease);
            return Err(e);
        }

        info!(
            "Waiting {} for server to settle",
            humanize(self.settle_delay)
        );

        let early_exit = tokio::select! {
            _ = tokio::time::sleep(self.settle_delay) => None,
            code = process.exited() => Some(code),
        };

        if let Some(code) = early_exit {
            process.drain_output().await;
            self.give_back(lease);
            return Err(SupervisorError::EarlyExit {
                code,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        process.mark_running();
        info!("Server started (pid {pid}) at {}", config.main_url);

        lease.process = Some(process);
        lease.config = Some(config);

        Ok(StartOutcome::Spawned {
            pid,
            count: acquisition.count,
            unresolved: expansion.unresolved,
        })
    }

    /// Compensate a failed spawn so the reference does not leak.
    fn give_back(&self, lease: &mut Lease) {
        lease.held = false;
        lease.process = None;
        match self.coordinator.abandon() {
            Ok(remaining) => debug!("Gave back server reference, {remaining} remaining"),
            Err(e) => error!("Failed to give back server reference: {e}"),
        }
    }

    /// Release this consumer's reference.
    ///
    /// The reference is released even if terminating the process tree
    /// fails; the termination error is returned afterwards.
    pub async fn stop(&self) -> SupervisorResult<StopOutcome> {
        let mut lease = self.lease.lock().await;

        if !lease.held {
            debug!("stop() without a held reference, nothing to release");
            return Ok(StopOutcome::NotHeld);
        }

        let release = self.coordinator.release()?;
        lease.held = false;
        lease.config = None;
        let process = lease.process.take();

        if release.remaining > 0 {
            info!(
                "Leaving server running for {} other consumer(s)",
                release.remaining
            );
            self.set_state(SupervisorState::Stopped);
            return Ok(StopOutcome::Detached {
                remaining: release.remaining,
            });
        }

        self.set_state(SupervisorState::Stopping);
        info!("Last consumer out, stopping server");

        let mut result = match process.as_ref().filter(|p| !p.state().is_stopped()) {
            Some(process) => process.terminate(),
            None => Ok(()),
        };

        // Our own server may have crashed and been respawned by another
        // consumer; that respawn is the recorded pid.
        let foreign_pid = release
            .server_pid
            .filter(|pid| process.as_ref().is_none_or(|p| p.pid() != *pid));

        if let Some(pid) = foreign_pid
            && is_process_running(pid)
        {
            info!("Terminating server {pid} spawned by another instance");
            result = result.and(self.terminator.terminate_tree(pid));
        }

        self.set_state(SupervisorState::Stopped);

        match result {
            Ok(()) => Ok(StopOutcome::Terminated),
            Err(e) => {
                error!("Failed to terminate server: {e}");
                Err(e)
            }
        }
    }

    /// Whether the shared record reports a live server.
    pub fn is_server_running(&self) -> bool {
        self.coordinator.is_running()
    }

    pub fn state(&self) -> SupervisorState {
        *self.state_rx.borrow()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SupervisorState> {
        self.state_rx.clone()
    }

    /// State of the server process this supervisor spawned, if any.
    pub async fn process_state(&self) -> Option<ProcessState> {
        self.lease.lock().await.process.as_ref().map(|p| p.state())
    }

    /// Subscribe to the owned process's state, if this supervisor spawned one.
    pub async fn subscribe_process(&self) -> Option<watch::Receiver<ProcessState>> {
        self.lease.lock().await.process.as_ref().map(|p| p.subscribe())
    }

    /// The configuration resolved by the current start, while active.
    pub async fn config(&self) -> Option<SiteConfig> {
        self.lease.lock().await.config.clone()
    }

    fn set_state(&self, state: SupervisorState) {
        let _ = self.state_tx.send(state);
    }
}

fn humanize(duration: Duration) -> String {
    format!("{:.1}s", duration.as_secs_f64())
}
