//! Keyboard to virtual gamepad mapping

use serde::{Deserialize, Serialize};
use winit::keyboard::KeyCode;

use super::codes::ButtonCode;
use super::event::{InputSource, KeyAction, KeyEvent};

/// Device id reported for key events synthesized from the desktop keyboard
pub const KEYBOARD_DEVICE_ID: u32 = u32::MAX;

/// Desktop keyboard bindings for every pad button and stick direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardMapping {
    #[serde(with = "super::keycode_serde")]
    pub dpad_up: KeyCode,
    #[serde(with = "super::keycode_serde")]
    pub dpad_down: KeyCode,
    #[serde(with = "super::keycode_serde")]
    pub dpad_left: KeyCode,
    #[serde(with = "super::keycode_serde")]
    pub dpad_right: KeyCode,

    #[serde(with = "super::keycode_serde")]
    pub cross: KeyCode,
    #[serde(with = "super::keycode_serde")]
    pub circle: KeyCode,
    #[serde(with = "super::keycode_serde")]
    pub square: KeyCode,
    #[serde(with = "super::keycode_serde")]
    pub triangle: KeyCode,

    #[serde(with = "super::keycode_serde")]
    pub l1: KeyCode,
    #[serde(with = "super::keycode_serde")]
    pub r1: KeyCode,
    #[serde(with = "super::keycode_serde")]
    pub l2: KeyCode,
    #[serde(with = "super::keycode_serde")]
    pub r2: KeyCode,

    #[serde(with = "super::keycode_serde")]
    pub start: KeyCode,
    #[serde(with = "super::keycode_serde")]
    pub select: KeyCode,

    #[serde(with = "super::keycode_serde")]
    pub left_stick_up: KeyCode,
    #[serde(with = "super::keycode_serde")]
    pub left_stick_right: KeyCode,
    #[serde(with = "super::keycode_serde")]
    pub left_stick_down: KeyCode,
    #[serde(with = "super::keycode_serde")]
    pub left_stick_left: KeyCode,

    #[serde(with = "super::keycode_serde")]
    pub right_stick_up: KeyCode,
    #[serde(with = "super::keycode_serde")]
    pub right_stick_right: KeyCode,
    #[serde(with = "super::keycode_serde")]
    pub right_stick_down: KeyCode,
    #[serde(with = "super::keycode_serde")]
    pub right_stick_left: KeyCode,

    /// Requests session termination like the platform back key
    #[serde(with = "super::keycode_serde")]
    pub back: KeyCode,
}

impl Default for KeyboardMapping {
    fn default() -> Self {
        Self {
            dpad_up: KeyCode::ArrowUp,
            dpad_down: KeyCode::ArrowDown,
            dpad_left: KeyCode::ArrowLeft,
            dpad_right: KeyCode::ArrowRight,

            // IJKL face cluster
            cross: KeyCode::KeyK,
            circle: KeyCode::KeyL,
            square: KeyCode::KeyJ,
            triangle: KeyCode::KeyI,

            l1: KeyCode::KeyE,
            r1: KeyCode::Digit3,
            l2: KeyCode::Digit1,
            r2: KeyCode::KeyQ,

            start: KeyCode::Enter,
            select: KeyCode::Backspace,

            left_stick_up: KeyCode::KeyW,
            left_stick_right: KeyCode::KeyD,
            left_stick_down: KeyCode::KeyS,
            left_stick_left: KeyCode::KeyA,

            right_stick_up: KeyCode::KeyT,
            right_stick_right: KeyCode::KeyH,
            right_stick_down: KeyCode::KeyG,
            right_stick_left: KeyCode::KeyF,

            back: KeyCode::Escape,
        }
    }
}

impl KeyboardMapping {
    /// Pad bindings (the back key excluded)
    pub fn bindings(&self) -> [(KeyCode, ButtonCode); 22] {
        [
            (self.dpad_up, ButtonCode::DPAD_UP),
            (self.dpad_down, ButtonCode::DPAD_DOWN),
            (self.dpad_left, ButtonCode::DPAD_LEFT),
            (self.dpad_right, ButtonCode::DPAD_RIGHT),
            (self.cross, ButtonCode::CROSS),
            (self.circle, ButtonCode::CIRCLE),
            (self.square, ButtonCode::SQUARE),
            (self.triangle, ButtonCode::TRIANGLE),
            (self.l1, ButtonCode::L1),
            (self.r1, ButtonCode::R1),
            (self.l2, ButtonCode::L2),
            (self.r2, ButtonCode::R2),
            (self.start, ButtonCode::START),
            (self.select, ButtonCode::SELECT),
            (self.left_stick_up, ButtonCode::L_UP),
            (self.left_stick_right, ButtonCode::L_RIGHT),
            (self.left_stick_down, ButtonCode::L_DOWN),
            (self.left_stick_left, ButtonCode::L_LEFT),
            (self.right_stick_up, ButtonCode::R_UP),
            (self.right_stick_right, ButtonCode::R_RIGHT),
            (self.right_stick_down, ButtonCode::R_DOWN),
            (self.right_stick_left, ButtonCode::R_LEFT),
        ]
    }

    pub fn lookup(&self, key: KeyCode) -> Option<ButtonCode> {
        self.bindings()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, code)| code)
    }

    /// Keys bound more than once (including the back key)
    pub fn conflicts(&self) -> Vec<KeyCode> {
        let mut keys: Vec<KeyCode> = self.bindings().iter().map(|(k, _)| *k).collect();
        keys.push(self.back);

        let mut conflicts = Vec::new();
        for (i, key) in keys.iter().enumerate() {
            if keys[i + 1..].contains(key) && !conflicts.contains(key) {
                conflicts.push(*key);
            }
        }
        conflicts
    }

    /// Translate a desktop key into the event a physical device would have produced.
    ///
    /// Bound keys become gamepad key events; the back key comes from a non-gamepad
    /// source so the router treats it as a termination request. Unbound keys give `None`.
    pub fn translate(&self, key: KeyCode, pressed: bool, repeat: bool) -> Option<KeyEvent> {
        let action = if pressed { KeyAction::Down } else { KeyAction::Up };
        let repeat_count = u32::from(repeat);

        if key == self.back {
            return Some(KeyEvent {
                device_id: KEYBOARD_DEVICE_ID,
                code: ButtonCode::BACK,
                source: InputSource::KEYBOARD,
                action,
                repeat_count,
            });
        }

        self.lookup(key).map(|code| {
            KeyEvent::gamepad(code, action)
                .with_device(KEYBOARD_DEVICE_ID)
                .with_repeat(repeat_count)
        })
    }
}
