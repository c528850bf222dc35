//! Singleton supervision of a shared development server.
//!
//! Several independent launches of the desktop shell cooperate through a
//! lock record in the system temp directory: the first launch spawns the
//! server, later launches only take a reference, and the last one to leave
//! tears the process tree down.

mod error;
mod lifecycle;
mod liveness;
mod lock;
mod lock_record;
mod outcome;
mod process;
mod process_state;
mod supervisor_state;
mod template;
mod terminate;

#[cfg(test)]
mod tests;

pub use error::{Result as SupervisorResult, SupervisorError};
pub use lifecycle::ProcessSupervisor;
pub use liveness::is_process_running;
pub use lock::{Acquisition, LockFileCoordinator, Release};
pub use lock_record::LockRecord;
pub use outcome::{StartOutcome, StopOutcome};
pub use process_state::ProcessState;
pub use supervisor_state::SupervisorState;
pub use template::{CommandTemplateEngine, Expansion};
pub use terminate::{TreeTerminator, platform_terminator};

#[cfg(unix)]
pub use terminate::ProcessGroupSignal;
#[cfg(windows)]
pub use terminate::TaskKillTree;

/// Diagnostic target for lines forwarded from the supervised server.
pub const SERVER_LOG_TARGET: &str = "youhost::server";

const LOCK_FILENAME: &str = "youhost-server-lock.json";
const PORT_PLACEHOLDER: &str = "port";
const HTTPS_SCHEME: &str = "https";
const HTTPS_DEFAULT_PORT: u16 = 443;
const HTTP_DEFAULT_PORT: u16 = 80;
/// How long a running record may lack a pid before its spawner is presumed dead.
const PENDING_SPAWN_GRACE: chrono::TimeDelta = chrono::TimeDelta::seconds(30);
const SERVER_LOG_EXTENSION: &str = "log";
const TAIL_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(200);
