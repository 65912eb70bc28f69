//! Error types for the session layer
//!
//! None of these cross into the host framework as panics. Entry points that can only
//! "do nothing" report an outcome value instead; these errors cover the few operations
//! whose caller has to react (initialize, restart, join).

use std::time::Duration;

use thiserror::Error;

use crate::session::Phase;

/// Failure joining the execution thread
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    /// The thread did not leave the native run loop within the join bound
    #[error("execution thread still running after {0:?}")]
    TimedOut(Duration),
    /// The thread unwound out of the native run loop
    #[error("execution thread panicked")]
    Panicked,
}

/// Session controller errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Native engine setup reported failure; the session stays degraded
    #[error("native engine initialization failed")]
    InitializeFailed,
    /// Operation requested in a phase that does not allow it
    #[error("operation not valid in phase {0}")]
    InvalidPhase(Phase),
    /// The session was torn down and accepts no further requests
    #[error("session already torn down")]
    TornDown,
    /// Joining the previous execution thread failed; restart aborted
    #[error("restart aborted: {0}")]
    RestartAborted(#[from] JoinError),
    /// The OS refused to create the execution thread
    #[error("failed to spawn execution thread: {0}")]
    Spawn(String),
}

/// Failure loading a native core library
#[derive(Error, Debug)]
pub enum NativeError {
    #[error("failed to load core {path}: {message}")]
    Load { path: String, message: String },
    #[error("core is missing symbol {0}")]
    MissingSymbol(&'static str),
    #[error("unsupported core ABI version {found} (expected {expected})")]
    AbiVersion { found: u32, expected: u32 },
}

/// Failure reading or writing `config.toml`
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
