//! yh-cli library
//!
//! Argument parsing, logging setup and the subcommands behind the
//! `youhost` binary.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
mod shutdown;

#[cfg(test)]
mod tests;

pub use cli::Cli;
pub use commands::Commands;
pub use error::{CliError, Result as CliResult};

use serde_json::Value;
use yh_config::{ConfigResolver, SupervisorSettings};

const APP_DIRECTORY: &str = "youhost";
const LOG_FILE_PREFIX: &str = "youhost";
const LOG_FILES_RETAINED: usize = 7;

/// Run the parsed command line and return the JSON document to print.
pub async fn execute(cli: &Cli, settings: &SupervisorSettings) -> CliResult<Value> {
    let resolver = ConfigResolver::with_installation_fallbacks(cli.config.clone());

    match &cli.command {
        Commands::Run => commands::run(resolver, settings).await,
        Commands::Status => commands::status(settings),
        Commands::Expand => commands::expand(&resolver),
        Commands::Reset { force } => commands::reset(settings, *force),
    }
}

/// Serialize `value` for stdout.
pub fn render(value: &Value, pretty: bool) -> CliResult<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
