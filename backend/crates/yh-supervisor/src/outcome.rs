/// Result of a successful `start()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// This consumer was first and spawned the server.
    Spawned {
        pid: u32,
        count: u32,
        /// Placeholders left in the command after expansion.
        unresolved: Vec<String>,
    },
    /// A server was already running; only the reference count changed.
    Joined { count: u32 },
}

impl StartOutcome {
    pub fn count(&self) -> u32 {
        match self {
            Self::Spawned { count, .. } | Self::Joined { count } => *count,
        }
    }

    pub fn spawned(&self) -> bool {
        matches!(self, Self::Spawned { .. })
    }
}

/// Result of a successful `stop()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Last consumer out; the process tree was signalled.
    Terminated,
    /// Other consumers remain; the server was left alone.
    Detached { remaining: u32 },
    /// This supervisor held no reference, nothing changed.
    NotHeld,
}
