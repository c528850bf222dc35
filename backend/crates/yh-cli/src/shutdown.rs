//! Waiting for the operator to end a `run`.

use crate::{CliError, CliResult};

/// Resolve on the first SIGINT or SIGTERM.
///
/// Signals are received on a dedicated thread and handed to the runtime
/// through a oneshot channel.
#[cfg(unix)]
pub async fn wait_for_shutdown() -> CliResult<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;
    use tracing::info;

    let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(CliError::signal)?;
    let (tx, rx) = tokio::sync::oneshot::channel();

    std::thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            info!("Received signal {sig}, shutting down...");
            let _ = tx.send(sig);
        }
    });

    rx.await
        .map(|_| ())
        .map_err(|e| CliError::signal(std::io::Error::other(e)))
}

/// Resolve on Ctrl-C.
#[cfg(not(unix))]
pub async fn wait_for_shutdown() -> CliResult<()> {
    tokio::signal::ctrl_c().await.map_err(CliError::signal)?;
    tracing::info!("Received Ctrl-C, shutting down...");
    Ok(())
}
