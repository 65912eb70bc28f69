//! vmhost core - emulator front-end session layer
//!
//! Drives an opaque native VM through its lifecycle on behalf of a windowing host.
//!
//! # Architecture
//!
//! - [`VmHandle`] - Capability set of the native engine (setup, run loop, pad, surface)
//! - [`Engine`] - Process-wide engine with its sticky initialization flag
//! - [`SessionController`] - Phase machine owning the single execution thread
//! - [`SurfaceLifecycle`] - Forwards surface changes and starts the session on first attach
//! - [`InputRouter`] - Translates touch, key and stick input into pad events
//! - [`Frontend`] - Maps host lifecycle events onto the pieces above

pub mod assets;
pub mod config;
pub mod engine;
pub mod error;
pub mod frontend;
pub mod headless;
pub mod input;
#[cfg(test)]
mod integration;
#[cfg(feature = "native")]
pub mod native;
pub mod session;
pub mod surface;
#[cfg(test)]
pub mod test_utils;
pub mod vm;

pub use config::Config;
pub use engine::Engine;
pub use error::{ConfigError, JoinError, NativeError, SessionError};
pub use frontend::{EventReceiver, EventSender, Frontend, HostAction, HostEvent};
pub use headless::HeadlessVm;
pub use input::{
    ButtonCode, ButtonEvent, InputConfig, InputRouter, KeyboardMapping, RouteOutcome,
    TouchControl,
};
#[cfg(feature = "native")]
pub use native::NativeCore;
pub use session::{JoinPolicy, Phase, SessionController, StartOutcome, TeardownReport};
pub use surface::SurfaceLifecycle;
pub use vm::{AspectRatio, RenderBackend, SurfaceHandle, VmHandle};
