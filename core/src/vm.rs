//! Opaque VM handle
//!
//! The native emulation engine is consumed only through the [`VmHandle`] capability set.
//! Every failure crosses the boundary as a boolean or sentinel value; nothing here panics
//! or returns a Rust error from the native side.
//!
//! Implementations must tolerate any call in any phase, including pad and surface updates
//! before `initialize` and after `shutdown`. `shutdown` must make a pending `run` return
//! within a bounded time.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::input::ButtonEvent;

/// Opaque reference to a presentation surface.
///
/// The value is whatever the host windowing layer uses to identify its native window
/// (window id, `ANativeWindow*`, ...). The front-end never dereferences it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(u64);

impl SurfaceHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Opaque GPU backend selector passed straight through to the native core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderBackend(pub i32);

impl RenderBackend {
    pub const OPENGL: Self = Self(12);
    pub const SOFTWARE: Self = Self(13);
    pub const VULKAN: Self = Self(14);

    /// Parse a backend name (`opengl`, `vulkan`, `software`/`sw`) or a raw integer code.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "opengl" | "ogl" | "gl" => Some(Self::OPENGL),
            "vulkan" | "vk" => Some(Self::VULKAN),
            "software" | "sw" => Some(Self::SOFTWARE),
            other => other.parse().ok().map(Self),
        }
    }

    pub const fn code(self) -> i32 {
        self.0
    }

    /// Lowercase config name for the known backends
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::OPENGL => Some("opengl"),
            Self::SOFTWARE => Some("software"),
            Self::VULKAN => Some("vulkan"),
            _ => None,
        }
    }
}

impl Serialize for RenderBackend {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.name() {
            Some(name) => serializer.serialize_str(name),
            None => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for RenderBackend {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::parse(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown render backend '{}'", name)))
    }
}

impl Default for RenderBackend {
    fn default() -> Self {
        Self::OPENGL
    }
}

impl fmt::Display for RenderBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::OPENGL => write!(f, "OpenGL"),
            Self::SOFTWARE => write!(f, "Software"),
            Self::VULKAN => write!(f, "Vulkan"),
            Self(code) => write!(f, "backend #{}", code),
        }
    }
}

/// Opaque aspect ratio selector passed straight through to the native core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AspectRatio(pub i32);

impl AspectRatio {
    pub const STRETCH: Self = Self(0);
    pub const AUTO_4_3_3_2: Self = Self(1);
    pub const RATIO_4_3: Self = Self(2);
    pub const RATIO_16_9: Self = Self(3);

    pub const fn code(self) -> i32 {
        self.0
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::AUTO_4_3_3_2
    }
}

/// Capability set of the native emulation engine.
///
/// `run` is only ever called from the execution thread; every other method may be called
/// from the UI thread while `run` is blocked on the execution thread.
pub trait VmHandle: Send + Sync + 'static {
    /// One-time engine setup. Returns `false` if the native side failed.
    fn initialize(&self, storage_path: &Path, platform_version: i32) -> bool;

    /// Boot `rom_path` and block until the VM halts. An empty path boots the firmware.
    fn run(&self, rom_path: &Path) -> bool;

    fn pause(&self);

    fn resume(&self);

    /// Ask the VM to halt. Safe when no `run` is active.
    fn shutdown(&self);

    fn save_to_slot(&self, slot: i32) -> bool;

    fn load_from_slot(&self, slot: i32) -> bool;

    /// Canonical pad update. Safe before the VM has started.
    fn set_button(&self, event: ButtonEvent);

    /// Presentation target changed. `None` means the surface went away.
    fn surface_changed(&self, surface: Option<SurfaceHandle>, width: u32, height: u32);

    fn set_render_backend(&self, backend: RenderBackend);

    fn set_aspect_ratio(&self, ratio: AspectRatio) {
        let _ = ratio;
    }

    /// Frames per second reported by the engine, `0.0` when unknown.
    fn fps(&self) -> f32 {
        0.0
    }

    /// Serial of the running game, if any.
    fn game_serial(&self) -> Option<String> {
        None
    }
}

impl<T: VmHandle + ?Sized> VmHandle for std::sync::Arc<T> {
    fn initialize(&self, storage_path: &Path, platform_version: i32) -> bool {
        (**self).initialize(storage_path, platform_version)
    }
    fn run(&self, rom_path: &Path) -> bool {
        (**self).run(rom_path)
    }
    fn pause(&self) {
        (**self).pause()
    }
    fn resume(&self) {
        (**self).resume()
    }
    fn shutdown(&self) {
        (**self).shutdown()
    }
    fn save_to_slot(&self, slot: i32) -> bool {
        (**self).save_to_slot(slot)
    }
    fn load_from_slot(&self, slot: i32) -> bool {
        (**self).load_from_slot(slot)
    }
    fn set_button(&self, event: ButtonEvent) {
        (**self).set_button(event)
    }
    fn surface_changed(&self, surface: Option<SurfaceHandle>, width: u32, height: u32) {
        (**self).surface_changed(surface, width, height)
    }
    fn set_render_backend(&self, backend: RenderBackend) {
        (**self).set_render_backend(backend)
    }
    fn set_aspect_ratio(&self, ratio: AspectRatio) {
        (**self).set_aspect_ratio(ratio)
    }
    fn fps(&self) -> f32 {
        (**self).fps()
    }
    fn game_serial(&self) -> Option<String> {
        (**self).game_serial()
    }
}
