//! youhost - shared development server launcher
//!
//! Every launch takes a reference on one shared server; the first launch
//! spawns it and the last one to exit stops it.
//!
//! # Examples
//!
//! ```bash
//! # Start or join the server described by ./config.json, stop on Ctrl-C
//! youhost run --config ./config.json
//!
//! # Inspect the shared lock record
//! youhost status --pretty
//!
//! # Show the command line that would be spawned
//! youhost expand
//!
//! # Recover after a crash left the record claiming a running server
//! youhost reset
//! ```

use yh_cli::{Cli, CliError, execute, logging, render};
use yh_config::SupervisorSettings;

use std::process::ExitCode;

use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match SupervisorSettings::load().and_then(|s| s.validate().map(|()| s)) {
        Ok(settings) => settings,
        Err(e) => return report(&CliError::from(e)),
    };

    let logs_dir = logging::default_logs_dir();
    if let Err(e) = logging::setup_logging(logs_dir.as_deref(), &settings.log_level) {
        eprintln!("Warning: {e}");
    }
    settings.log_summary();

    let result = execute(&cli, &settings)
        .await
        .and_then(|value| render(&value, cli.pretty));

    match result {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => report(&e),
    }
}

fn report(error: &CliError) -> ExitCode {
    eprintln!("Error: {error}");
    if let Some(hint) = error.recovery_hint() {
        eprintln!();
        eprintln!("{hint}");
    }
    ExitCode::FAILURE
}
