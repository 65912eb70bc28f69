//! Session lifecycle phase

use std::fmt;

/// Discrete lifecycle state of a session
///
/// `Uninitialized → Initialized → Running ⇄ Paused → ShuttingDown → Stopped`.
/// `Stopped` is terminal except for an explicit restart; nothing restarts automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Uninitialized,
    Initialized,
    Running,
    Paused,
    ShuttingDown,
    Stopped,
}

impl Phase {
    /// Phases in which an execution thread is expected to be alive
    pub fn expects_thread(self) -> bool {
        matches!(self, Phase::Running | Phase::Paused | Phase::ShuttingDown)
    }

    /// Phases from which `start` may spawn a thread
    pub fn can_start(self) -> bool {
        matches!(self, Phase::Initialized | Phase::Paused | Phase::Stopped)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Initialized => "initialized",
            Phase::Running => "running",
            Phase::Paused => "paused",
            Phase::ShuttingDown => "shutting down",
            Phase::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
