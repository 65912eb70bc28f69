//! Execution thread ownership
//!
//! The thread body is a single blocking `VmHandle::run` call. Liveness is an explicit
//! state the thread itself publishes: `InRun` right before entering the native call and
//! `Exited` right after it returns (or unwinds). The controller only reads it.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::JoinError;
use crate::vm::VmHandle;

/// How often `shutdown` is re-sent while waiting for the thread to leave the run loop.
///
/// Covers a shutdown issued before the engine entered its run loop.
pub const SHUTDOWN_RESEND_INTERVAL: Duration = Duration::from_millis(100);

/// Bound on how long a join may block the calling thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPolicy {
    /// Wait forever; relies on the engine always honouring `shutdown`
    Unbounded,
    /// Give up after the duration and report [`JoinError::TimedOut`]
    Bounded(Duration),
}

impl JoinPolicy {
    /// `0` means unbounded
    pub fn from_millis(ms: u64) -> Self {
        if ms == 0 {
            Self::Unbounded
        } else {
            Self::Bounded(Duration::from_millis(ms))
        }
    }

    pub fn timeout(self) -> Option<Duration> {
        match self {
            Self::Unbounded => None,
            Self::Bounded(d) => Some(d),
        }
    }
}

impl Default for JoinPolicy {
    fn default() -> Self {
        Self::Bounded(Duration::from_secs(10))
    }
}

/// Liveness as published by the execution thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ThreadState {
    /// Spawned, not yet inside the native run loop
    Spawned = 0,
    /// Blocked inside `VmHandle::run`
    InRun = 1,
    /// Returned (or unwound) from `VmHandle::run`
    Exited = 2,
}

impl ThreadState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Spawned,
            1 => Self::InRun,
            _ => Self::Exited,
        }
    }
}

/// Publishes `Exited` and wakes the joiner however the thread body ends
struct ExitGuard {
    state: Arc<AtomicU8>,
    exited: SyncSender<()>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.state.store(ThreadState::Exited as u8, Ordering::SeqCst);
        let _ = self.exited.try_send(());
    }
}

pub(crate) struct ExecutionThread {
    state: Arc<AtomicU8>,
    exited: Receiver<()>,
    handle: JoinHandle<bool>,
    rom_path: PathBuf,
}

impl ExecutionThread {
    pub(crate) fn spawn<V: VmHandle>(vm: Arc<V>, rom_path: PathBuf) -> io::Result<Self> {
        let state = Arc::new(AtomicU8::new(ThreadState::Spawned as u8));
        let (tx, rx) = mpsc::sync_channel(1);

        let thread_state = state.clone();
        let thread_rom = rom_path.clone();
        let handle = thread::Builder::new()
            .name("vm-exec".into())
            .spawn(move || {
                let _guard = ExitGuard {
                    state: thread_state.clone(),
                    exited: tx,
                };
                thread_state.store(ThreadState::InRun as u8, Ordering::SeqCst);
                tracing::debug!("Execution thread entering run loop");
                let halted_cleanly = vm.run(&thread_rom);
                tracing::debug!(
                    "Execution thread left run loop (clean: {})",
                    halted_cleanly
                );
                halted_cleanly
            })?;

        Ok(Self {
            state,
            exited: rx,
            handle,
            rom_path,
        })
    }

    pub(crate) fn state(&self) -> ThreadState {
        ThreadState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.state() != ThreadState::Exited
    }

    pub(crate) fn rom_path(&self) -> &Path {
        &self.rom_path
    }

    /// Block until the thread has left the run loop, re-sending `shutdown` periodically.
    ///
    /// Callers must have issued `shutdown` first. The thread is kept on timeout so the
    /// liveness check keeps blocking new starts.
    pub(crate) fn wait_for_exit<V: VmHandle>(
        &self,
        vm: &V,
        policy: JoinPolicy,
    ) -> Result<(), JoinError> {
        let start = Instant::now();
        loop {
            let slice = match policy.timeout() {
                Some(limit) => {
                    let elapsed = start.elapsed();
                    if elapsed >= limit {
                        return Err(JoinError::TimedOut(limit));
                    }
                    (limit - elapsed).min(SHUTDOWN_RESEND_INTERVAL)
                }
                None => SHUTDOWN_RESEND_INTERVAL,
            };

            match self.exited.recv_timeout(slice) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return Ok(()),
                Err(RecvTimeoutError::Timeout) => {
                    if self.is_alive() {
                        tracing::trace!("Execution thread still alive, re-sending shutdown");
                        vm.shutdown();
                    } else {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Reap a thread that has already exited. Returns the value `run` returned.
    pub(crate) fn finish(self) -> Result<bool, JoinError> {
        self.handle.join().map_err(|_| JoinError::Panicked)
    }
}
