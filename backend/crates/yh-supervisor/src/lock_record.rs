use crate::{PENDING_SPAWN_GRACE, is_process_running};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shared reference count and running flag for the supervised server.
///
/// Serialized as `{"running": bool, "count": n, "pid": n, ...}`. Every field
/// after `count` is optional so a bare `{running, count}` record is still
/// accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub running: bool,
    pub count: u32,
    /// Process (group leader) of the server, once it has been spawned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// When the current spawner took the record, until it records a pid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawning_since: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl LockRecord {
    /// Running flag reconciled with the OS.
    ///
    /// A record that claims to be running is stale when it names a dead
    /// server process, or when its spawner never recorded a pid within
    /// [`PENDING_SPAWN_GRACE`] (the spawner died mid-start).
    pub fn is_live(&self) -> bool {
        if !self.running {
            return false;
        }

        match (self.pid, self.spawning_since.as_deref()) {
            (Some(pid), _) => is_process_running(pid),
            (None, Some(since)) => Self::within_spawn_grace(since, Utc::now()),
            (None, None) => true,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.running && !self.is_live()
    }

    fn within_spawn_grace(since: &str, now: DateTime<Utc>) -> bool {
        match DateTime::parse_from_rfc3339(since) {
            Ok(since) => now.signed_duration_since(since) < PENDING_SPAWN_GRACE,
            Err(_) => false,
        }
    }
}
