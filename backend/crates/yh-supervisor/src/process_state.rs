/// State of the server process owned by one supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Spawned, settle delay not yet elapsed
    Starting,
    /// Settle delay elapsed, assumed to be serving
    Running,
    /// Exited, either on request or on its own
    Stopped { exit_code: Option<i32> },
}

impl ProcessState {
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped { .. })
    }
}
