//! Windowed host
//!
//! Maps winit's application lifecycle onto frontend host events: resume/suspend become
//! foreground enter/exit plus surface attach/detach, window resizes become surface
//! changes, and keyboard input goes through the pad mapping and hotkeys.

use std::time::{Duration, Instant};

use anyhow::Result;
use vmhost_core::config::HotkeyConfig;
use vmhost_core::{
    Config, Frontend, HostAction, HostEvent, KeyboardMapping, SurfaceHandle, TeardownReport,
    VmHandle,
};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// Device polling cadence while the window is idle
const POLL_INTERVAL: Duration = Duration::from_millis(8);
const SAVE_SLOTS: i32 = 10;

/// Hotkey bindings and the slot/pause state they drive
struct Hotkeys {
    bindings: HotkeyConfig,
    slot: i32,
    /// Paused from the hotkey; focus changes leave it alone
    user_paused: bool,
}

/// What a key press meant as a hotkey
#[derive(Debug, PartialEq)]
enum Hotkey {
    Unbound,
    Handled,
    Dispatch(HostEvent),
}

impl Hotkeys {
    fn new(bindings: HotkeyConfig, slot: i32) -> Self {
        Self {
            bindings,
            slot,
            user_paused: false,
        }
    }

    fn press(&mut self, key: KeyCode) -> Hotkey {
        if key == self.bindings.save_state {
            // Save and load resume the session
            self.user_paused = false;
            Hotkey::Dispatch(HostEvent::SaveState(self.slot))
        } else if key == self.bindings.load_state {
            self.user_paused = false;
            Hotkey::Dispatch(HostEvent::LoadState(self.slot))
        } else if key == self.bindings.next_slot {
            self.slot = (self.slot + 1).rem_euclid(SAVE_SLOTS);
            tracing::info!("Save slot {}", self.slot);
            Hotkey::Handled
        } else if key == self.bindings.pause_toggle {
            self.user_paused = !self.user_paused;
            Hotkey::Dispatch(if self.user_paused {
                HostEvent::ForegroundExit
            } else {
                HostEvent::ForegroundEnter
            })
        } else {
            Hotkey::Unbound
        }
    }
}

pub struct WindowApp<V: VmHandle> {
    frontend: Frontend<V>,
    keyboard: KeyboardMapping,
    hotkeys: Hotkeys,
    window: Option<Window>,
}

impl<V: VmHandle> WindowApp<V> {
    pub fn new(frontend: Frontend<V>, config: &Config) -> Self {
        Self {
            frontend,
            keyboard: config.input.keyboard.clone(),
            hotkeys: Hotkeys::new(config.hotkeys.clone(), config.session.save_slot),
            window: None,
        }
    }

    fn dispatch(&mut self, event_loop: &ActiveEventLoop, event: HostEvent) {
        if self.frontend.handle(event) == HostAction::Terminate {
            event_loop.exit();
        }
    }

    fn attach_surface(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = &self.window else {
            return;
        };
        let size = window.inner_size();
        let event = HostEvent::SurfaceChanged {
            surface: Some(SurfaceHandle::from_raw(u64::from(window.id()))),
            width: size.width,
            height: size.height,
        };
        self.dispatch(event_loop, event);
    }

    /// Returns `true` if the key was a hotkey
    fn hotkey(&mut self, event_loop: &ActiveEventLoop, key: KeyCode) -> bool {
        match self.hotkeys.press(key) {
            Hotkey::Unbound => false,
            Hotkey::Handled => true,
            Hotkey::Dispatch(event) => {
                self.dispatch(event_loop, event);
                true
            }
        }
    }

    fn keyboard_input(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        let PhysicalKey::Code(key) = event.physical_key else {
            return;
        };
        let pressed = event.state == ElementState::Pressed;

        if pressed && !event.repeat && self.hotkey(event_loop, key) {
            return;
        }
        if let Some(key_event) = self.keyboard.translate(key, pressed, event.repeat) {
            self.dispatch(event_loop, HostEvent::Key(key_event));
        }
    }
}

impl<V: VmHandle> ApplicationHandler for WindowApp<V> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window_attributes = Window::default_attributes()
                .with_title("vmhost")
                .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

            match event_loop.create_window(window_attributes) {
                Ok(window) => self.window = Some(window),
                Err(e) => {
                    tracing::error!("Failed to create window: {}", e);
                    self.dispatch(event_loop, HostEvent::Destroy);
                    return;
                }
            }
        }

        if !self.hotkeys.user_paused {
            self.dispatch(event_loop, HostEvent::ForegroundEnter);
        }
        self.attach_surface(event_loop);
    }

    fn suspended(&mut self, event_loop: &ActiveEventLoop) {
        self.dispatch(event_loop, HostEvent::ForegroundExit);
        self.dispatch(event_loop, HostEvent::SurfaceDestroyed);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Window close requested");
                self.dispatch(event_loop, HostEvent::Destroy);
                event_loop.exit();
            }
            WindowEvent::Resized(_) => self.attach_surface(event_loop),
            WindowEvent::Focused(focused) if !self.hotkeys.user_paused => {
                let event = if focused {
                    HostEvent::ForegroundEnter
                } else {
                    HostEvent::ForegroundExit
                };
                self.dispatch(event_loop, event);
            }
            WindowEvent::KeyboardInput { event, .. } => self.keyboard_input(event_loop, &event),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.frontend.poll_devices() == HostAction::Terminate {
            event_loop.exit();
            return;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + POLL_INTERVAL));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.frontend.teardown();
    }
}

/// Run the window event loop until the session terminates.
pub fn run<V: VmHandle>(frontend: Frontend<V>, config: &Config) -> Result<TeardownReport> {
    let event_loop = EventLoop::new()?;

    let mut app = WindowApp::new(frontend, config);
    event_loop.run_app(&mut app)?;

    Ok(app.frontend.teardown())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_toggle() {
        let mut hotkeys = Hotkeys::new(HotkeyConfig::default(), 0);
        assert_eq!(
            hotkeys.press(KeyCode::F5),
            Hotkey::Dispatch(HostEvent::ForegroundExit)
        );
        assert!(hotkeys.user_paused);
        assert_eq!(
            hotkeys.press(KeyCode::F5),
            Hotkey::Dispatch(HostEvent::ForegroundEnter)
        );
        assert!(!hotkeys.user_paused);
    }

    #[test]
    fn test_save_and_load_clear_user_pause() {
        let mut hotkeys = Hotkeys::new(HotkeyConfig::default(), 4);
        hotkeys.press(KeyCode::F5);
        assert_eq!(
            hotkeys.press(KeyCode::F1),
            Hotkey::Dispatch(HostEvent::SaveState(4))
        );
        assert!(!hotkeys.user_paused);
        // The next toggle pauses again rather than resuming a running session
        assert_eq!(
            hotkeys.press(KeyCode::F5),
            Hotkey::Dispatch(HostEvent::ForegroundExit)
        );
        assert_eq!(
            hotkeys.press(KeyCode::F3),
            Hotkey::Dispatch(HostEvent::LoadState(4))
        );
        assert!(!hotkeys.user_paused);
    }

    #[test]
    fn test_next_slot_wraps() {
        let mut hotkeys = Hotkeys::new(HotkeyConfig::default(), 9);
        assert_eq!(hotkeys.press(KeyCode::F2), Hotkey::Handled);
        assert_eq!(hotkeys.slot, 0);
        assert_eq!(hotkeys.press(KeyCode::KeyA), Hotkey::Unbound);
    }
}
