//! In-process reference engine
//!
//! [`HeadlessVm`] implements the VM handle without any emulation: `run` ticks a frame
//! counter at a fixed rate until `shutdown`, honouring pause. Save slots hold the frame
//! counter as an opaque snapshot. Used by the launcher when no native core is given and
//! as a well-behaved engine for exercising the session layer.

use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use hashbrown::HashMap;

use crate::input::{ButtonCode, ButtonEvent};
use crate::vm::{AspectRatio, RenderBackend, SurfaceHandle, VmHandle};

const FRAME_TIME: Duration = Duration::from_micros(16_667);

#[derive(Debug, Default)]
struct State {
    initialized: bool,
    running: bool,
    paused: bool,
    halt_requested: bool,
    frame: u64,
    rom: Option<PathBuf>,
    slots: HashMap<i32, Vec<u8>>,
    pad: HashMap<ButtonCode, i32>,
    surface: Option<(Option<SurfaceHandle>, u32, u32)>,
    backend: RenderBackend,
    aspect_ratio: AspectRatio,
    fps: f32,
}

pub struct HeadlessVm {
    state: Mutex<State>,
    wake: Condvar,
    frame_time: Duration,
}

impl HeadlessVm {
    pub fn new() -> Self {
        Self::with_frame_time(FRAME_TIME)
    }

    pub fn with_frame_time(frame_time: Duration) -> Self {
        Self {
            state: Mutex::new(State::default()),
            wake: Condvar::new(),
            frame_time,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn frame(&self) -> u64 {
        self.lock().frame
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    /// Current magnitude of a pad code, `None` when released
    pub fn pad_state(&self, code: ButtonCode) -> Option<i32> {
        self.lock().pad.get(&code).copied()
    }

    pub fn render_backend(&self) -> RenderBackend {
        self.lock().backend
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.lock().aspect_ratio
    }

    pub fn surface(&self) -> Option<(Option<SurfaceHandle>, u32, u32)> {
        self.lock().surface
    }
}

impl Default for HeadlessVm {
    fn default() -> Self {
        Self::new()
    }
}

impl VmHandle for HeadlessVm {
    fn initialize(&self, storage_path: &Path, platform_version: i32) -> bool {
        tracing::info!(
            "Headless engine setup (storage: {}, platform version: {})",
            storage_path.display(),
            platform_version
        );
        self.lock().initialized = true;
        true
    }

    fn run(&self, rom_path: &Path) -> bool {
        let mut state = self.lock();
        if !state.initialized {
            tracing::warn!("Headless engine run before setup");
            return false;
        }
        state.running = true;
        state.halt_requested = false;
        state.frame = 0;
        state.rom = Some(rom_path.to_path_buf());
        tracing::info!("Headless engine running {:?}", rom_path);

        let started = Instant::now();
        while !state.halt_requested {
            if state.paused {
                state.fps = 0.0;
                state = self.wake.wait(state).unwrap_or_else(|e| e.into_inner());
                continue;
            }
            state = self
                .wake
                .wait_timeout(state, self.frame_time)
                .unwrap_or_else(|e| e.into_inner())
                .0;
            if !state.paused && !state.halt_requested {
                state.frame += 1;
                let elapsed = started.elapsed().as_secs_f32();
                if elapsed > 0.0 {
                    state.fps = state.frame as f32 / elapsed;
                }
            }
        }

        state.running = false;
        state.halt_requested = false;
        state.fps = 0.0;
        state.pad.clear();
        tracing::info!("Headless engine halted after {} frames", state.frame);
        true
    }

    fn pause(&self) {
        self.lock().paused = true;
        self.wake.notify_all();
    }

    fn resume(&self) {
        self.lock().paused = false;
        self.wake.notify_all();
    }

    fn shutdown(&self) {
        let mut state = self.lock();
        if state.running {
            state.halt_requested = true;
            self.wake.notify_all();
        }
    }

    fn save_to_slot(&self, slot: i32) -> bool {
        let mut state = self.lock();
        if !state.running {
            return false;
        }
        let snapshot = state.frame.to_le_bytes().to_vec();
        state.slots.insert(slot, snapshot);
        true
    }

    fn load_from_slot(&self, slot: i32) -> bool {
        let mut state = self.lock();
        if !state.running {
            return false;
        }
        let frame = match state.slots.get(&slot) {
            Some(snapshot) => match <[u8; 8]>::try_from(snapshot.as_slice()) {
                Ok(bytes) => u64::from_le_bytes(bytes),
                Err(_) => return false,
            },
            None => return false,
        };
        state.frame = frame;
        true
    }

    fn set_button(&self, event: ButtonEvent) {
        let mut state = self.lock();
        if event.pressed {
            state.pad.insert(event.code, event.magnitude);
        } else {
            state.pad.remove(&event.code);
        }
    }

    fn surface_changed(&self, surface: Option<SurfaceHandle>, width: u32, height: u32) {
        self.lock().surface = Some((surface, width, height));
    }

    fn set_render_backend(&self, backend: RenderBackend) {
        self.lock().backend = backend;
    }

    fn set_aspect_ratio(&self, ratio: AspectRatio) {
        self.lock().aspect_ratio = ratio;
    }

    fn fps(&self) -> f32 {
        self.lock().fps
    }

    fn game_serial(&self) -> Option<String> {
        let state = self.lock();
        if !state.running {
            return None;
        }
        let stem = state.rom.as_ref()?.file_stem()?.to_string_lossy().to_uppercase();
        if stem.is_empty() { None } else { Some(stem) }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    fn spawn_run(vm: &Arc<HeadlessVm>, rom: &str) -> thread::JoinHandle<bool> {
        let vm = vm.clone();
        let rom = PathBuf::from(rom);
        thread::spawn(move || vm.run(&rom))
    }

    fn wait_running(vm: &HeadlessVm) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !vm.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(vm.is_running());
    }

    #[test]
    fn test_run_requires_setup() {
        let vm = HeadlessVm::new();
        assert!(!vm.run(Path::new("game.iso")));
    }

    #[test]
    fn test_shutdown_unblocks_run() {
        let vm = Arc::new(HeadlessVm::with_frame_time(Duration::from_millis(1)));
        vm.initialize(Path::new("/tmp"), 33);
        let handle = spawn_run(&vm, "game.iso");
        wait_running(&vm);

        vm.shutdown();
        assert!(handle.join().unwrap());
        assert!(!vm.is_running());
    }

    #[test]
    fn test_shutdown_unblocks_paused_run() {
        let vm = Arc::new(HeadlessVm::with_frame_time(Duration::from_millis(1)));
        vm.initialize(Path::new("/tmp"), 33);
        let handle = spawn_run(&vm, "game.iso");
        wait_running(&vm);

        vm.pause();
        vm.shutdown();
        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_shutdown_without_run_is_harmless() {
        let vm = HeadlessVm::new();
        vm.shutdown();
        vm.initialize(Path::new("/tmp"), 33);
        assert!(!vm.is_running());
    }

    #[test]
    fn test_save_and_load_slot() {
        let vm = Arc::new(HeadlessVm::with_frame_time(Duration::from_millis(1)));
        vm.initialize(Path::new("/tmp"), 33);
        assert!(!vm.save_to_slot(0));

        let handle = spawn_run(&vm, "slus_123.iso");
        wait_running(&vm);
        vm.pause();
        let frame = vm.frame();
        assert!(vm.save_to_slot(1));
        assert!(!vm.load_from_slot(2));
        assert!(vm.load_from_slot(1));
        assert_eq!(vm.frame(), frame);
        assert_eq!(vm.game_serial().as_deref(), Some("SLUS_123"));

        vm.shutdown();
        handle.join().unwrap();
    }

    #[test]
    fn test_pad_state_tracks_buttons() {
        let vm = HeadlessVm::new();
        vm.set_button(ButtonEvent::press(ButtonCode::L_UP, 29489));
        assert_eq!(vm.pad_state(ButtonCode::L_UP), Some(29489));
        vm.set_button(ButtonEvent::release(ButtonCode::L_UP));
        assert_eq!(vm.pad_state(ButtonCode::L_UP), None);
    }
}
