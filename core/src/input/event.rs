//! Raw and canonical input events

use smallvec::SmallVec;

use super::codes::ButtonCode;

/// Canonical pad update sent to the VM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ButtonEvent {
    pub code: ButtonCode,
    /// `[0, 32767]` for axis codes, always `0` for digital buttons
    pub magnitude: i32,
    pub pressed: bool,
}

impl ButtonEvent {
    pub fn press(code: ButtonCode, magnitude: i32) -> Self {
        let magnitude = if code.is_axis() { magnitude } else { 0 };
        Self {
            code,
            magnitude,
            pressed: true,
        }
    }

    pub fn release(code: ButtonCode) -> Self {
        Self {
            code,
            magnitude: 0,
            pressed: false,
        }
    }
}

/// Input source class bitmask of a raw event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InputSource(pub u32);

impl InputSource {
    pub const KEYBOARD: Self = Self(0x101);
    pub const GAMEPAD: Self = Self(0x401);
    pub const TOUCHSCREEN: Self = Self(0x1002);
    pub const JOYSTICK: Self = Self(0x0100_0010);

    /// All gamepad class bits present
    pub fn is_gamepad(self) -> bool {
        self.0 & Self::GAMEPAD.0 == Self::GAMEPAD.0
    }

    pub fn is_joystick(self) -> bool {
        self.0 & Self::JOYSTICK.0 == Self::JOYSTICK.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Down,
    Up,
}

/// Key event from a physical device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub device_id: u32,
    pub code: ButtonCode,
    pub source: InputSource,
    pub action: KeyAction,
    /// Non-zero for auto-repeat events
    pub repeat_count: u32,
}

impl KeyEvent {
    pub fn gamepad(code: ButtonCode, action: KeyAction) -> Self {
        Self {
            device_id: 0,
            code,
            source: InputSource::GAMEPAD,
            action,
            repeat_count: 0,
        }
    }

    pub fn with_source(mut self, source: InputSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_repeat(mut self, repeat_count: u32) -> Self {
        self.repeat_count = repeat_count;
        self
    }

    pub fn with_device(mut self, device_id: u32) -> Self {
        self.device_id = device_id;
        self
    }
}

/// Analog stick axis of a motion event, in device orientation (`+y` is down)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StickAxis {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

impl StickAxis {
    /// Codes for the negative and positive direction of this axis
    pub fn codes(self) -> (ButtonCode, ButtonCode) {
        match self {
            StickAxis::LeftX => (ButtonCode::L_LEFT, ButtonCode::L_RIGHT),
            StickAxis::LeftY => (ButtonCode::L_UP, ButtonCode::L_DOWN),
            StickAxis::RightX => (ButtonCode::R_LEFT, ButtonCode::R_RIGHT),
            StickAxis::RightY => (ButtonCode::R_UP, ButtonCode::R_DOWN),
        }
    }
}

/// Motion event from a physical device, axis values in `[-1.0, 1.0]`
#[derive(Debug, Clone, PartialEq)]
pub struct MotionEvent {
    pub device_id: u32,
    pub source: InputSource,
    pub axes: SmallVec<[(StickAxis, f32); 4]>,
}

impl MotionEvent {
    pub fn gamepad(axes: impl IntoIterator<Item = (StickAxis, f32)>) -> Self {
        Self {
            device_id: 0,
            source: InputSource::GAMEPAD,
            axes: axes.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchAction {
    Down,
    Up,
    Cancel,
    /// Finger moved within the control; ignored
    Move,
}
