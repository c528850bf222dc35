/// Lifecycle of one logical consumer of the shared server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// No start requested yet
    Idle,
    /// Resolving config, acquiring the lock, spawning or settling
    Starting,
    /// Holding a reference to a server believed to be up
    Active,
    /// Last consumer out, terminating the process tree
    Stopping,
    /// Reference released (or start failed); `start()` may be called again
    Stopped,
}
