//! VM session controller
//!
//! Owns the single background execution thread and drives the VM through
//! `Uninitialized → Initialized → Running ⇄ Paused → ShuttingDown → Stopped`.
//! Every entry point is called from one thread (the host UI thread or the frontend's
//! dispatch loop); only the execution thread's liveness is shared.

mod device;
mod phase;
mod thread;

pub use device::{DeviceEvent, DeviceManager};
pub use phase::Phase;
pub use thread::{JoinPolicy, SHUTDOWN_RESEND_INTERVAL, ThreadState};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::engine::Engine;
use crate::error::{JoinError, SessionError};
use crate::vm::{AspectRatio, RenderBackend, SurfaceHandle, VmHandle};
use thread::ExecutionThread;

/// Result of a start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new execution thread was spawned
    Started,
    /// An execution thread is already alive; nothing happened
    AlreadyRunning,
    /// The session is not in a phase that allows starting; nothing happened
    Rejected(Phase),
}

/// How teardown went
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownReport {
    /// Join outcome for the last execution thread (`Ok` if there was none)
    pub join: Result<(), JoinError>,
}

pub struct SessionController<V: VmHandle> {
    engine: Arc<Engine<V>>,
    phase: Phase,
    rom_path: PathBuf,
    surface: Option<SurfaceHandle>,
    thread: Option<ExecutionThread>,
    devices: Option<Box<dyn DeviceManager>>,
    /// The VM and devices were last told to pause
    paused: bool,
    join_policy: JoinPolicy,
    threads_spawned: u64,
    torn_down: bool,
}

impl<V: VmHandle> SessionController<V> {
    pub fn new(engine: Arc<Engine<V>>, join_policy: JoinPolicy) -> Self {
        // A previous session in this process may already have set the engine up
        let phase = if engine.is_initialized() {
            Phase::Initialized
        } else {
            Phase::Uninitialized
        };
        Self {
            engine,
            phase,
            rom_path: PathBuf::new(),
            surface: None,
            thread: None,
            devices: None,
            paused: false,
            join_policy,
            threads_spawned: 0,
            torn_down: false,
        }
    }

    pub fn attach_device_manager(&mut self, devices: Box<dyn DeviceManager>) {
        self.devices = Some(devices);
    }

    pub fn device_manager_mut(&mut self) -> Option<&mut (dyn DeviceManager + 'static)> {
        self.devices.as_deref_mut()
    }

    pub fn vm(&self) -> &Arc<V> {
        self.engine.vm()
    }

    pub fn engine(&self) -> &Arc<Engine<V>> {
        &self.engine
    }

    /// Current phase, with an engine that halted by itself reported as `Stopped`
    pub fn phase(&self) -> Phase {
        if self.phase.expects_thread() && !self.is_thread_alive() {
            Phase::Stopped
        } else {
            self.phase
        }
    }

    pub fn is_thread_alive(&self) -> bool {
        self.thread.as_ref().is_some_and(ExecutionThread::is_alive)
    }

    pub fn thread_state(&self) -> Option<ThreadState> {
        self.thread.as_ref().map(ExecutionThread::state)
    }

    /// Number of execution threads spawned over the session's life
    pub fn threads_spawned(&self) -> u64 {
        self.threads_spawned
    }

    pub fn rom_path(&self) -> &Path {
        &self.rom_path
    }

    /// ROM the live execution thread was started with
    pub fn running_rom(&self) -> Option<&Path> {
        self.thread
            .as_ref()
            .filter(|t| t.is_alive())
            .map(ExecutionThread::rom_path)
    }

    pub fn surface(&self) -> Option<SurfaceHandle> {
        self.surface
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub(crate) fn set_surface(&mut self, surface: Option<SurfaceHandle>) {
        self.surface = surface;
    }

    /// One-time native setup. A no-op once the session is past `Uninitialized`.
    pub fn initialize(
        &mut self,
        storage_path: &Path,
        platform_version: i32,
    ) -> Result<(), SessionError> {
        self.reconcile();
        if self.torn_down {
            return Err(SessionError::TornDown);
        }
        if self.phase != Phase::Uninitialized {
            tracing::debug!("initialize ignored in phase {}", self.phase);
            return Ok(());
        }

        self.engine.initialize_once(storage_path, platform_version)?;
        self.phase = Phase::Initialized;
        tracing::info!("Session initialized");
        Ok(())
    }

    /// Spawn the execution thread for `rom_path`. Empty path boots the firmware.
    pub fn start(&mut self, rom_path: impl Into<PathBuf>) -> Result<StartOutcome, SessionError> {
        self.reconcile();
        if self.torn_down {
            return Ok(StartOutcome::Rejected(Phase::Stopped));
        }
        if self.is_thread_alive() {
            tracing::debug!("start ignored: execution thread already alive");
            return Ok(StartOutcome::AlreadyRunning);
        }
        if !self.phase.can_start() {
            tracing::debug!("start ignored in phase {}", self.phase);
            return Ok(StartOutcome::Rejected(self.phase));
        }

        self.rom_path = rom_path.into();
        self.spawn()
    }

    /// Start with the currently selected ROM
    pub fn start_selected(&mut self) -> Result<StartOutcome, SessionError> {
        let rom = self.rom_path.clone();
        self.start(rom)
    }

    pub fn pause(&mut self) {
        self.reconcile();
        if self.torn_down {
            return;
        }
        self.engine.vm().pause();
        if let Some(devices) = self.devices.as_mut() {
            devices.set_frozen(true);
        }
        self.paused = true;
        if self.phase == Phase::Running {
            self.phase = Phase::Paused;
            tracing::info!("Session paused");
        }
    }

    pub fn resume(&mut self) {
        self.reconcile();
        if self.torn_down {
            return;
        }
        self.lift_pause();
        if self.phase == Phase::Paused {
            self.phase = Phase::Running;
            tracing::info!("Session resumed");
        }
    }

    /// Tell the VM to halt. Never joins.
    pub fn shutdown(&mut self) {
        self.reconcile();
        if self.torn_down || self.phase == Phase::Stopped {
            tracing::debug!("shutdown ignored in phase {}", self.phase);
            return;
        }

        self.engine.vm().shutdown();
        self.phase = if self.is_thread_alive() {
            Phase::ShuttingDown
        } else {
            Phase::Stopped
        };
        tracing::info!("Session shutdown requested ({})", self.phase);
    }

    /// Halt the current run, join it, then start `new_rom`.
    ///
    /// A join failure aborts the restart and leaves the session `Stopped` without a new
    /// thread. A pause in effect is lifted before the new run starts.
    pub fn restart(&mut self, new_rom: impl Into<PathBuf>) -> Result<StartOutcome, SessionError> {
        self.reconcile();
        if self.torn_down {
            return Err(SessionError::TornDown);
        }
        if self.phase == Phase::Uninitialized {
            return Err(SessionError::InvalidPhase(self.phase));
        }

        let new_rom = new_rom.into();
        tracing::info!("Restarting session with {:?}", new_rom);

        if self.thread.is_some() {
            if self.is_thread_alive() {
                self.engine.vm().shutdown();
                self.phase = Phase::ShuttingDown;
            }
            if let Err(e) = self.join_thread() {
                self.phase = Phase::Stopped;
                tracing::error!("Restart aborted: {}", e);
                return Err(SessionError::RestartAborted(e));
            }
            self.phase = Phase::Stopped;
        }

        if self.paused {
            tracing::debug!("Lifting pause for the restarted run");
            self.lift_pause();
        }
        self.rom_path = new_rom;
        self.spawn()
    }

    /// Forward a save request, then resume exactly once whatever the outcome
    pub fn save_to_slot(&mut self, slot: i32) -> bool {
        if self.torn_down {
            return false;
        }
        let ok = self.engine.vm().save_to_slot(slot);
        if ok {
            tracing::info!("Saved state to slot {}", slot);
        } else {
            tracing::warn!("Saving state to slot {} failed", slot);
        }
        self.resume();
        ok
    }

    /// Forward a load request, then resume exactly once whatever the outcome
    pub fn load_from_slot(&mut self, slot: i32) -> bool {
        if self.torn_down {
            return false;
        }
        let ok = self.engine.vm().load_from_slot(slot);
        if ok {
            tracing::info!("Loaded state from slot {}", slot);
        } else {
            tracing::warn!("Loading state from slot {} failed", slot);
        }
        self.resume();
        ok
    }

    pub fn set_render_backend(&mut self, backend: RenderBackend) {
        if self.torn_down {
            return;
        }
        tracing::info!("Render backend: {}", backend);
        self.engine.vm().set_render_backend(backend);
    }

    pub fn set_aspect_ratio(&mut self, ratio: AspectRatio) {
        if self.torn_down {
            return;
        }
        self.engine.vm().set_aspect_ratio(ratio);
    }

    /// Replace the selected ROM. Refused while an execution thread is alive.
    pub fn select_rom(&mut self, rom_path: impl Into<PathBuf>) -> bool {
        if self.torn_down || self.is_thread_alive() {
            tracing::debug!("select_rom ignored: execution thread alive");
            return false;
        }
        self.rom_path = rom_path.into();
        true
    }

    /// Final shutdown: halt, join, release devices.
    ///
    /// A join failure is logged and otherwise ignored; the host is expected to exit
    /// the process afterwards. Only the first call does anything.
    pub fn teardown(&mut self) -> TeardownReport {
        if self.torn_down {
            return TeardownReport { join: Ok(()) };
        }
        tracing::info!("Tearing down session");

        self.engine.vm().shutdown();
        if self.is_thread_alive() {
            self.phase = Phase::ShuttingDown;
        }
        let join = self.join_thread();
        if let Err(e) = &join {
            tracing::error!("Execution thread did not join during teardown: {}", e);
        }

        if let Some(mut devices) = self.devices.take() {
            devices.release();
        }

        self.phase = Phase::Stopped;
        self.surface = None;
        self.torn_down = true;
        TeardownReport { join }
    }

    fn spawn(&mut self) -> Result<StartOutcome, SessionError> {
        // Reap a previous thread that already left its run loop
        if let Some(old) = self.thread.take() {
            if let Err(e) = old.finish() {
                tracing::warn!("Previous execution thread ended abnormally: {}", e);
            }
        }

        let thread = ExecutionThread::spawn(self.engine.vm().clone(), self.rom_path.clone())
            .map_err(|e| {
                tracing::error!("Failed to spawn execution thread: {}", e);
                SessionError::Spawn(e.to_string())
            })?;

        self.thread = Some(thread);
        self.threads_spawned += 1;
        self.phase = Phase::Running;
        tracing::info!(
            "Execution thread started (rom: {})",
            if self.rom_path.as_os_str().is_empty() {
                "<firmware>".to_string()
            } else {
                self.rom_path.display().to_string()
            }
        );
        Ok(StartOutcome::Started)
    }

    fn lift_pause(&mut self) {
        self.engine.vm().resume();
        if let Some(devices) = self.devices.as_mut() {
            devices.set_frozen(false);
        }
        self.paused = false;
    }

    /// Wait for the current thread (if any) and reap it. On timeout it is kept.
    fn join_thread(&mut self) -> Result<(), JoinError> {
        let Some(thread) = self.thread.as_ref() else {
            return Ok(());
        };
        thread.wait_for_exit(self.engine.vm().as_ref(), self.join_policy)?;

        match self.thread.take() {
            Some(thread) => thread.finish().map(|_| ()),
            None => Ok(()),
        }
    }

    /// Move to `Stopped` if the engine left its run loop on its own
    fn reconcile(&mut self) {
        let observed = self.phase();
        if observed != self.phase {
            tracing::info!("Execution thread exited; session {} -> {}", self.phase, observed);
            self.phase = observed;
        }
    }
}

impl<V: VmHandle> Drop for SessionController<V> {
    fn drop(&mut self) {
        if !self.torn_down && self.thread.is_some() {
            self.teardown();
        }
    }
}
