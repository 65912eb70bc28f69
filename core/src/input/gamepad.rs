//! Physical controller polling through gilrs

use gilrs::{Axis, Button, EventType, Gilrs};

use super::codes::ButtonCode;
use super::event::{KeyAction, KeyEvent, MotionEvent, StickAxis};
use crate::session::{DeviceEvent, DeviceManager};

/// HID device manager backed by gilrs
pub struct GamepadManager {
    /// None if initialization failed or the manager was released
    gilrs: Option<Gilrs>,
    frozen: bool,
}

impl GamepadManager {
    pub fn new() -> Self {
        let gilrs = match Gilrs::new() {
            Ok(g) => Some(g),
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize gamepad support: {}. Gamepads will not be available.",
                    e
                );
                None
            }
        };
        Self {
            gilrs,
            frozen: false,
        }
    }

    pub fn is_available(&self) -> bool {
        self.gilrs.is_some()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn connected_count(&self) -> usize {
        self.gilrs
            .as_ref()
            .map(|g| g.gamepads().count())
            .unwrap_or(0)
    }
}

impl Default for GamepadManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceManager for GamepadManager {
    fn set_frozen(&mut self, frozen: bool) {
        if self.frozen != frozen {
            tracing::debug!(
                "Gamepad polling {}",
                if frozen { "frozen" } else { "resumed" }
            );
        }
        self.frozen = frozen;
    }

    fn poll(&mut self) -> Vec<DeviceEvent> {
        let Some(gilrs) = self.gilrs.as_mut() else {
            return Vec::new();
        };

        let mut events = Vec::new();
        // Drain even while frozen so stale input is not replayed on resume
        while let Some(event) = gilrs.next_event() {
            if self.frozen {
                continue;
            }
            let device_id = usize::from(event.id) as u32;
            match event.event {
                EventType::ButtonPressed(button, _) => {
                    if let Some(code) = map_button(button) {
                        events.push(DeviceEvent::Key(
                            KeyEvent::gamepad(code, KeyAction::Down).with_device(device_id),
                        ));
                    }
                }
                EventType::ButtonRepeated(button, _) => {
                    if let Some(code) = map_button(button) {
                        events.push(DeviceEvent::Key(
                            KeyEvent::gamepad(code, KeyAction::Down)
                                .with_device(device_id)
                                .with_repeat(1),
                        ));
                    }
                }
                EventType::ButtonReleased(button, _) => {
                    if let Some(code) = map_button(button) {
                        events.push(DeviceEvent::Key(
                            KeyEvent::gamepad(code, KeyAction::Up).with_device(device_id),
                        ));
                    }
                }
                EventType::AxisChanged(axis, value, _) => {
                    if let Some((stick_axis, value)) = map_axis(axis, value) {
                        let mut motion = MotionEvent::gamepad([(stick_axis, value)]);
                        motion.device_id = device_id;
                        events.push(DeviceEvent::Motion(motion));
                    }
                }
                EventType::Connected => {
                    tracing::info!("Gamepad {} connected", event.id);
                }
                EventType::Disconnected => {
                    tracing::info!("Gamepad {} disconnected", event.id);
                    // Center both sticks so nothing stays held
                    let mut motion = MotionEvent::gamepad([
                        (StickAxis::LeftX, 0.0),
                        (StickAxis::LeftY, 0.0),
                        (StickAxis::RightX, 0.0),
                        (StickAxis::RightY, 0.0),
                    ]);
                    motion.device_id = device_id;
                    events.push(DeviceEvent::Motion(motion));
                }
                _ => {}
            }
        }
        events
    }

    fn release(&mut self) {
        if self.gilrs.take().is_some() {
            tracing::info!("Released gamepad devices");
        }
    }
}

fn map_button(button: Button) -> Option<ButtonCode> {
    let code = match button {
        Button::South => ButtonCode::CROSS,
        Button::East => ButtonCode::CIRCLE,
        Button::West => ButtonCode::SQUARE,
        Button::North => ButtonCode::TRIANGLE,
        Button::LeftTrigger => ButtonCode::L1,
        Button::RightTrigger => ButtonCode::R1,
        Button::LeftTrigger2 => ButtonCode::L2,
        Button::RightTrigger2 => ButtonCode::R2,
        Button::LeftThumb => ButtonCode::L3,
        Button::RightThumb => ButtonCode::R3,
        Button::Start => ButtonCode::START,
        Button::Select => ButtonCode::SELECT,
        Button::DPadUp => ButtonCode::DPAD_UP,
        Button::DPadDown => ButtonCode::DPAD_DOWN,
        Button::DPadLeft => ButtonCode::DPAD_LEFT,
        Button::DPadRight => ButtonCode::DPAD_RIGHT,
        _ => return None,
    };
    Some(code)
}

/// gilrs reports Y up-positive; motion events use down-positive
fn map_axis(axis: Axis, value: f32) -> Option<(StickAxis, f32)> {
    match axis {
        Axis::LeftStickX => Some((StickAxis::LeftX, value)),
        Axis::LeftStickY => Some((StickAxis::LeftY, -value)),
        Axis::RightStickX => Some((StickAxis::RightX, value)),
        Axis::RightStickY => Some((StickAxis::RightY, -value)),
        _ => None,
    }
}
