//! Input handling: canonical codes, touch controls, physical devices and routing

mod codes;
mod event;
#[cfg(feature = "gamepad")]
mod gamepad;
mod keyboard_mapping;
pub(crate) mod keycode_serde;
mod router;
mod touch;

pub use codes::{AXIS_MAX, ButtonCode, TOUCH_MAGNITUDE_SCALE, nominal_magnitude};
pub use event::{
    ButtonEvent, InputSource, KeyAction, KeyEvent, MotionEvent, StickAxis, TouchAction,
};
#[cfg(feature = "gamepad")]
pub use gamepad::GamepadManager;
pub use keyboard_mapping::{KEYBOARD_DEVICE_ID, KeyboardMapping};
pub use router::{InputRouter, RouteOutcome};
pub use touch::{StickZone, TouchControl};

use serde::{Deserialize, Serialize};

/// `[input]` section of the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Axis magnitude for touch and key presses, as a percentage of full deflection
    pub touch_magnitude_percent: f32,
    /// Physical stick deadzone (0.0-1.0)
    pub stick_deadzone: f32,
    pub keyboard: KeyboardMapping,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            touch_magnitude_percent: 90.0,
            stick_deadzone: 0.15,
            keyboard: KeyboardMapping::default(),
        }
    }
}
