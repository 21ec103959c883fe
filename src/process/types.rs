use std::time::{Duration, SystemTime};
use tokio::process::Child;

/// Lifecycle status of the supervised service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    NotStarted,
    Running,
    Stopped,
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceStatus::NotStarted => write!(f, "not started"),
            ServiceStatus::Running => write!(f, "running"),
            ServiceStatus::Stopped => write!(f, "stopped"),
        }
    }
}

/// Handle to one live instance of the supervised service.
///
/// Replaced wholesale on every restart, never mutated in place; the
/// controller holds at most one of these at a time.
#[derive(Debug)]
pub struct SupervisedProcess {
    /// The child process handle
    pub child: Child,

    /// Process ID assigned by the OS
    pub pid: u32,

    /// When this instance was launched
    pub started_at: SystemTime,
}

impl SupervisedProcess {
    pub fn new(child: Child, pid: u32) -> Self {
        Self {
            child,
            pid,
            started_at: SystemTime::now(),
        }
    }

    /// Whether the instance is still running (has not been reaped)
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    pub fn uptime(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.started_at)
            .unwrap_or(Duration::from_secs(0))
    }
}
