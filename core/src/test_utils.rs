//! Shared test utilities for integration and unit tests

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::input::ButtonEvent;
use crate::session::{DeviceEvent, DeviceManager};
use crate::vm::{AspectRatio, RenderBackend, SurfaceHandle, VmHandle};

// ============================================================================
// Test VM
// ============================================================================

/// Every call a [`TestVm`] received, in order
#[derive(Debug, Clone, PartialEq)]
pub enum VmCall {
    Initialize {
        storage_path: PathBuf,
        platform_version: i32,
    },
    RunStarted(PathBuf),
    RunFinished(PathBuf),
    Pause,
    Resume,
    Shutdown,
    SaveToSlot(i32),
    LoadFromSlot(i32),
    SetButton(ButtonEvent),
    SurfaceChanged {
        surface: Option<SurfaceHandle>,
        width: u32,
        height: u32,
    },
    SetRenderBackend(RenderBackend),
    SetAspectRatio(AspectRatio),
}

#[derive(Default)]
struct RunState {
    active: usize,
    halt: bool,
}

/// Recording VM whose `run` parks until `shutdown`
pub struct TestVm {
    calls: Mutex<Vec<VmCall>>,
    run_state: Mutex<RunState>,
    run_changed: Condvar,
    max_concurrent_runs: AtomicUsize,
    initialize_result: AtomicBool,
    save_result: AtomicBool,
    load_result: AtomicBool,
    /// Simulates an engine that never leaves its run loop
    ignore_shutdown: AtomicBool,
    panic_in_run: AtomicBool,
}

impl TestVm {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            run_state: Mutex::new(RunState::default()),
            run_changed: Condvar::new(),
            max_concurrent_runs: AtomicUsize::new(0),
            initialize_result: AtomicBool::new(true),
            save_result: AtomicBool::new(true),
            load_result: AtomicBool::new(true),
            ignore_shutdown: AtomicBool::new(false),
            panic_in_run: AtomicBool::new(false),
        }
    }

    pub fn set_initialize_result(&self, ok: bool) {
        self.initialize_result.store(ok, Ordering::SeqCst);
    }

    pub fn set_save_result(&self, ok: bool) {
        self.save_result.store(ok, Ordering::SeqCst);
    }

    pub fn set_load_result(&self, ok: bool) {
        self.load_result.store(ok, Ordering::SeqCst);
    }

    pub fn set_ignore_shutdown(&self, ignore: bool) {
        self.ignore_shutdown.store(ignore, Ordering::SeqCst);
    }

    pub fn set_panic_in_run(&self, panic: bool) {
        self.panic_in_run.store(panic, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<VmCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&VmCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    /// Pad events received, in order
    pub fn buttons(&self) -> Vec<ButtonEvent> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                VmCall::SetButton(event) => Some(*event),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn active_runs(&self) -> usize {
        self.run_state.lock().unwrap().active
    }

    pub fn max_concurrent_runs(&self) -> usize {
        self.max_concurrent_runs.load(Ordering::SeqCst)
    }

    /// Block until `active_runs() == n` or the timeout elapses
    pub fn wait_for_active_runs(&self, n: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.run_state.lock().unwrap();
        while state.active != n {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = self
                .run_changed
                .wait_timeout(state, deadline - now)
                .unwrap()
                .0;
        }
        true
    }

    /// Make the active run return as if the engine halted by itself
    pub fn halt_from_engine(&self) {
        let mut state = self.run_state.lock().unwrap();
        if state.active > 0 {
            state.halt = true;
            self.run_changed.notify_all();
        }
    }

    fn record(&self, call: VmCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Default for TestVm {
    fn default() -> Self {
        Self::new()
    }
}

impl VmHandle for TestVm {
    fn initialize(&self, storage_path: &Path, platform_version: i32) -> bool {
        self.record(VmCall::Initialize {
            storage_path: storage_path.to_path_buf(),
            platform_version,
        });
        self.initialize_result.load(Ordering::SeqCst)
    }

    fn run(&self, rom_path: &Path) -> bool {
        self.record(VmCall::RunStarted(rom_path.to_path_buf()));
        {
            let mut state = self.run_state.lock().unwrap();
            state.active += 1;
            self.max_concurrent_runs
                .fetch_max(state.active, Ordering::SeqCst);
            self.run_changed.notify_all();
        }

        if self.panic_in_run.load(Ordering::SeqCst) {
            let mut state = self.run_state.lock().unwrap();
            state.active -= 1;
            self.run_changed.notify_all();
            drop(state);
            panic!("test engine crashed");
        }

        let mut state = self.run_state.lock().unwrap();
        while !state.halt {
            state = self.run_changed.wait(state).unwrap();
        }
        state.halt = false;
        state.active -= 1;
        self.run_changed.notify_all();
        drop(state);

        self.record(VmCall::RunFinished(rom_path.to_path_buf()));
        true
    }

    fn pause(&self) {
        self.record(VmCall::Pause);
    }

    fn resume(&self) {
        self.record(VmCall::Resume);
    }

    fn shutdown(&self) {
        self.record(VmCall::Shutdown);
        if self.ignore_shutdown.load(Ordering::SeqCst) {
            return;
        }
        let mut state = self.run_state.lock().unwrap();
        if state.active > 0 {
            state.halt = true;
            self.run_changed.notify_all();
        }
    }

    fn save_to_slot(&self, slot: i32) -> bool {
        self.record(VmCall::SaveToSlot(slot));
        self.save_result.load(Ordering::SeqCst)
    }

    fn load_from_slot(&self, slot: i32) -> bool {
        self.record(VmCall::LoadFromSlot(slot));
        self.load_result.load(Ordering::SeqCst)
    }

    fn set_button(&self, event: ButtonEvent) {
        self.record(VmCall::SetButton(event));
    }

    fn surface_changed(&self, surface: Option<SurfaceHandle>, width: u32, height: u32) {
        self.record(VmCall::SurfaceChanged {
            surface,
            width,
            height,
        });
    }

    fn set_render_backend(&self, backend: RenderBackend) {
        self.record(VmCall::SetRenderBackend(backend));
    }

    fn set_aspect_ratio(&self, ratio: AspectRatio) {
        self.record(VmCall::SetAspectRatio(ratio));
    }
}

// ============================================================================
// Test device manager
// ============================================================================

/// Calls seen by a [`TestDeviceManager`]
#[derive(Debug, Default)]
pub struct DeviceLog {
    pub frozen: Vec<bool>,
    pub released: usize,
    pub pending: Vec<DeviceEvent>,
}

/// Device manager that records freeze/release and replays queued events
#[derive(Clone, Default)]
pub struct TestDeviceManager {
    pub log: Arc<Mutex<DeviceLog>>,
}

impl TestDeviceManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: DeviceEvent) {
        self.log.lock().unwrap().pending.push(event);
    }

    pub fn frozen_calls(&self) -> Vec<bool> {
        self.log.lock().unwrap().frozen.clone()
    }

    pub fn released(&self) -> usize {
        self.log.lock().unwrap().released
    }
}

impl DeviceManager for TestDeviceManager {
    fn set_frozen(&mut self, frozen: bool) {
        self.log.lock().unwrap().frozen.push(frozen);
    }

    fn poll(&mut self) -> Vec<DeviceEvent> {
        let mut log = self.log.lock().unwrap();
        let frozen = log.frozen.last().copied().unwrap_or(false);
        if frozen || log.released > 0 {
            return Vec::new();
        }
        std::mem::take(&mut log.pending)
    }

    fn release(&mut self) {
        self.log.lock().unwrap().released += 1;
    }
}
