//! Native core loaded from a shared library
//!
//! The core exports a small C ABI:
//!
//! | symbol | signature |
//! |---|---|
//! | `vmhost_abi_version` | `fn() -> u32` |
//! | `vmhost_initialize` | `fn(storage: *const c_char, platform_version: i32) -> bool` |
//! | `vmhost_run` | `fn(rom: *const c_char) -> bool` (blocks) |
//! | `vmhost_pause` / `vmhost_resume` / `vmhost_shutdown` | `fn()` |
//! | `vmhost_save_state` / `vmhost_load_state` | `fn(slot: i32) -> bool` |
//! | `vmhost_set_pad_button` | `fn(code: i32, magnitude: i32, pressed: bool)` |
//! | `vmhost_surface_changed` | `fn(surface: u64, width: u32, height: u32)`, `0` = none |
//! | `vmhost_set_renderer` | `fn(code: i32)` |
//!
//! Optional: `vmhost_set_aspect_ratio(i32)`, `vmhost_get_fps() -> f32`,
//! `vmhost_game_serial(buf: *mut c_char, len: usize) -> usize`.

use std::ffi::{CString, c_char};
use std::path::Path;

use libloading::Library;

use crate::error::NativeError;
use crate::input::ButtonEvent;
use crate::vm::{AspectRatio, RenderBackend, SurfaceHandle, VmHandle};

pub const ABI_VERSION: u32 = 1;

pub struct NativeCore {
    // Keeps the function pointers below valid
    _lib: Library,

    initialize: extern "C" fn(*const c_char, i32) -> bool,
    run: extern "C" fn(*const c_char) -> bool,
    pause: extern "C" fn(),
    resume: extern "C" fn(),
    shutdown: extern "C" fn(),
    save_state: extern "C" fn(i32) -> bool,
    load_state: extern "C" fn(i32) -> bool,
    set_pad_button: extern "C" fn(i32, i32, bool),
    surface_changed: extern "C" fn(u64, u32, u32),
    set_renderer: extern "C" fn(i32),

    set_aspect_ratio: Option<extern "C" fn(i32)>,
    get_fps: Option<extern "C" fn() -> f32>,
    game_serial: Option<extern "C" fn(*mut c_char, usize) -> usize>,
}

impl NativeCore {
    /// Load a core from a shared library.
    ///
    /// # Safety
    /// The library must implement the `vmhost_*` ABI with exactly the signatures above;
    /// loading runs its initializers.
    pub unsafe fn load(path: &Path) -> Result<Self, NativeError> {
        // SAFETY: caller guarantees the library is a well-formed core
        let lib = unsafe { Library::new(path) }.map_err(|e| NativeError::Load {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        macro_rules! get_fn {
            ($name:literal, $type:ty) => {
                // SAFETY: symbol types are fixed by the core ABI
                *unsafe { lib.get::<$type>(concat!($name, "\0").as_bytes()) }
                    .map_err(|_| NativeError::MissingSymbol($name))?
            };
        }
        macro_rules! get_optional_fn {
            ($name:literal, $type:ty) => {
                // SAFETY: as above
                unsafe { lib.get::<$type>(concat!($name, "\0").as_bytes()) }
                    .ok()
                    .map(|symbol| *symbol)
            };
        }

        let abi_version = get_fn!("vmhost_abi_version", extern "C" fn() -> u32);
        let found = abi_version();
        if found != ABI_VERSION {
            return Err(NativeError::AbiVersion {
                found,
                expected: ABI_VERSION,
            });
        }

        let initialize = get_fn!("vmhost_initialize", extern "C" fn(*const c_char, i32) -> bool);
        let run = get_fn!("vmhost_run", extern "C" fn(*const c_char) -> bool);
        let pause = get_fn!("vmhost_pause", extern "C" fn());
        let resume = get_fn!("vmhost_resume", extern "C" fn());
        let shutdown = get_fn!("vmhost_shutdown", extern "C" fn());
        let save_state = get_fn!("vmhost_save_state", extern "C" fn(i32) -> bool);
        let load_state = get_fn!("vmhost_load_state", extern "C" fn(i32) -> bool);
        let set_pad_button = get_fn!("vmhost_set_pad_button", extern "C" fn(i32, i32, bool));
        let surface_changed = get_fn!("vmhost_surface_changed", extern "C" fn(u64, u32, u32));
        let set_renderer = get_fn!("vmhost_set_renderer", extern "C" fn(i32));
        let set_aspect_ratio = get_optional_fn!("vmhost_set_aspect_ratio", extern "C" fn(i32));
        let get_fps = get_optional_fn!("vmhost_get_fps", extern "C" fn() -> f32);
        let game_serial = get_optional_fn!(
            "vmhost_game_serial",
            extern "C" fn(*mut c_char, usize) -> usize
        );

        let core = NativeCore {
            _lib: lib,
            initialize,
            run,
            pause,
            resume,
            shutdown,
            save_state,
            load_state,
            set_pad_button,
            surface_changed,
            set_renderer,
            set_aspect_ratio,
            get_fps,
            game_serial,
        };

        tracing::info!("Loaded native core {}", path.display());
        Ok(core)
    }
}

fn path_to_cstring(path: &Path) -> Option<CString> {
    match CString::new(path.to_string_lossy().into_owned()) {
        Ok(s) => Some(s),
        Err(_) => {
            tracing::warn!("Path {:?} contains a NUL byte", path);
            None
        }
    }
}

impl VmHandle for NativeCore {
    fn initialize(&self, storage_path: &Path, platform_version: i32) -> bool {
        match path_to_cstring(storage_path) {
            Some(storage) => (self.initialize)(storage.as_ptr(), platform_version),
            None => false,
        }
    }

    fn run(&self, rom_path: &Path) -> bool {
        match path_to_cstring(rom_path) {
            Some(rom) => (self.run)(rom.as_ptr()),
            None => false,
        }
    }

    fn pause(&self) {
        (self.pause)()
    }

    fn resume(&self) {
        (self.resume)()
    }

    fn shutdown(&self) {
        (self.shutdown)()
    }

    fn save_to_slot(&self, slot: i32) -> bool {
        (self.save_state)(slot)
    }

    fn load_from_slot(&self, slot: i32) -> bool {
        (self.load_state)(slot)
    }

    fn set_button(&self, event: ButtonEvent) {
        (self.set_pad_button)(event.code.code(), event.magnitude, event.pressed)
    }

    fn surface_changed(&self, surface: Option<SurfaceHandle>, width: u32, height: u32) {
        (self.surface_changed)(surface.map_or(0, SurfaceHandle::raw), width, height)
    }

    fn set_render_backend(&self, backend: RenderBackend) {
        (self.set_renderer)(backend.code())
    }

    fn set_aspect_ratio(&self, ratio: AspectRatio) {
        match self.set_aspect_ratio {
            Some(f) => f(ratio.code()),
            None => tracing::debug!("Core does not support aspect ratio selection"),
        }
    }

    fn fps(&self) -> f32 {
        self.get_fps.map_or(0.0, |f| f())
    }

    fn game_serial(&self) -> Option<String> {
        let f = self.game_serial?;
        let mut buf = [0 as c_char; 64];
        let len = f(buf.as_mut_ptr(), buf.len()).min(buf.len());
        if len == 0 {
            return None;
        }
        let bytes: Vec<u8> = buf[..len].iter().map(|&c| c as u8).collect();
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_library_reports_path() {
        let result = unsafe { NativeCore::load(Path::new("/nonexistent/libcore.so")) };
        match result {
            Err(NativeError::Load { path, .. }) => assert!(path.contains("libcore.so")),
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("loaded a nonexistent library"),
        }
    }

    #[test]
    fn test_path_with_nul_rejected() {
        assert!(path_to_cstring(Path::new("a\0b")).is_none());
        assert!(path_to_cstring(Path::new("")).is_some());
    }
}
