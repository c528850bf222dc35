//! The `youhost` subcommands.

use crate::{CliError, CliResult};

use clap::Subcommand;
use serde_json::{Value, json};
use tracing::{error, info, warn};
use yh_config::{ConfigResolver, SupervisorSettings};
use yh_supervisor::{
    CommandTemplateEngine, LockFileCoordinator, ProcessSupervisor, StartOutcome, StopOutcome,
    is_process_running,
};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start (or join) the shared server and keep it until interrupted
    Run,

    /// Show the shared lock record
    Status,

    /// Print the command line the server would be started with
    Expand,

    /// Clear the shared lock record after a crash
    Reset {
        /// Reset even if the record names a live server
        #[arg(long)]
        force: bool,
    },
}

/// Start, wait for SIGINT/SIGTERM, stop.
///
/// A failed start is returned as an error so the process exits non-zero.
pub async fn run(resolver: ConfigResolver, settings: &SupervisorSettings) -> CliResult<Value> {
    let supervisor = ProcessSupervisor::from_settings(resolver, settings);

    let outcome = supervisor.start().await?;
    match &outcome {
        StartOutcome::Spawned {
            pid, unresolved, ..
        } => {
            info!("Started server (pid {pid})");
            if !unresolved.is_empty() {
                warn!("Command still contains placeholders: {}", unresolved.join(", "));
            }
        }
        StartOutcome::Joined { count } => info!("Joined running server ({count} consumers)"),
    }

    if let Some(config) = supervisor.config().await {
        println!("{}", config.main_url);
    }

    let shutdown = crate::shutdown::wait_for_shutdown().await;
    if let Err(e) = &shutdown {
        error!("{e}, stopping now");
    }

    let stopped = supervisor.stop().await?;
    shutdown?;

    Ok(json!({
        "start": start_json(&outcome),
        "stop": stop_json(stopped),
    }))
}

/// The lock record plus what the OS says about its pid.
pub fn status(settings: &SupervisorSettings) -> CliResult<Value> {
    let coordinator = LockFileCoordinator::new(&settings.lock_file);
    let record = coordinator.read()?;

    let pid_alive = record
        .as_ref()
        .and_then(|r| r.pid)
        .map(is_process_running);

    Ok(json!({
        "lock_file": coordinator.path(),
        "server_log": coordinator.server_log_path(),
        "record": record,
        "live": record.as_ref().is_some_and(|r| r.is_live()),
        "stale": record.as_ref().is_some_and(|r| r.is_stale()),
        "pid_alive": pid_alive,
    }))
}

/// Resolve the configuration and expand its command template.
pub fn expand(resolver: &ConfigResolver) -> CliResult<Value> {
    let config = resolver.load()?;
    let expansion = CommandTemplateEngine::expand(
        &config.command_template,
        &config.template_parameters,
        &config.main_url,
    );

    Ok(json!({
        "config_file": config.origin,
        "source_directory": config.source_directory,
        "source_directory_exists": config.source_directory.is_dir(),
        "command": expansion.command,
        "unresolved": expansion.unresolved,
    }))
}

/// Rewrite the record as `{running: false, count: 0}`.
pub fn reset(settings: &SupervisorSettings, force: bool) -> CliResult<Value> {
    let coordinator = LockFileCoordinator::new(&settings.lock_file);
    let previous = coordinator.read()?;

    if let Some(record) = &previous
        && record.is_live()
        && !force
    {
        return Err(CliError::refused(format!(
            "server is running with {} consumer(s)",
            record.count
        )));
    }

    coordinator.reset()?;
    info!("Lock record at {} reset", coordinator.path().display());

    Ok(json!({
        "lock_file": coordinator.path(),
        "previous": previous,
    }))
}

fn start_json(outcome: &StartOutcome) -> Value {
    match outcome {
        StartOutcome::Spawned {
            pid,
            count,
            unresolved,
        } => json!({ "spawned": true, "pid": pid, "count": count, "unresolved": unresolved }),
        StartOutcome::Joined { count } => json!({ "spawned": false, "count": count }),
    }
}

fn stop_json(outcome: StopOutcome) -> Value {
    match outcome {
        StopOutcome::Terminated => json!({ "terminated": true }),
        StopOutcome::Detached { remaining } => {
            json!({ "terminated": false, "remaining": remaining })
        }
        StopOutcome::NotHeld => json!({ "terminated": false }),
    }
}
