//! Canonical button and axis codes
//!
//! These are the values the native pad layer understands. Digital buttons share the
//! platform keycode space; stick directions live above [`ButtonCode::AXIS_BASE`].

use std::fmt;

/// Full-scale magnitude of an axis code
pub const AXIS_MAX: i32 = 32767;

/// Reference value the touch nominal magnitude is a percentage of
pub const TOUCH_MAGNITUDE_SCALE: i32 = 32766;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ButtonCode(pub i32);

impl ButtonCode {
    /// Reserved "back" key; never forwarded to the VM
    pub const BACK: Self = Self(4);

    pub const DPAD_UP: Self = Self(19);
    pub const DPAD_DOWN: Self = Self(20);
    pub const DPAD_LEFT: Self = Self(21);
    pub const DPAD_RIGHT: Self = Self(22);

    pub const CROSS: Self = Self(96);
    pub const CIRCLE: Self = Self(97);
    pub const SQUARE: Self = Self(99);
    pub const TRIANGLE: Self = Self(100);
    pub const L1: Self = Self(102);
    pub const R1: Self = Self(103);
    pub const L2: Self = Self(104);
    pub const R2: Self = Self(105);
    pub const L3: Self = Self(106);
    pub const R3: Self = Self(107);
    pub const START: Self = Self(108);
    pub const SELECT: Self = Self(109);

    /// First axis code; everything at or above is an analog stick direction
    pub const AXIS_BASE: i32 = 110;

    pub const L_UP: Self = Self(110);
    pub const L_RIGHT: Self = Self(111);
    pub const L_DOWN: Self = Self(112);
    pub const L_LEFT: Self = Self(113);
    pub const R_UP: Self = Self(120);
    pub const R_RIGHT: Self = Self(121);
    pub const R_DOWN: Self = Self(122);
    pub const R_LEFT: Self = Self(123);

    pub fn code(self) -> i32 {
        self.0
    }

    pub fn is_axis(self) -> bool {
        self.0 >= Self::AXIS_BASE
    }

    /// The direction on the same stick pointing the other way
    pub fn opposite_axis(self) -> Option<Self> {
        let opposite = match self {
            Self::L_UP => Self::L_DOWN,
            Self::L_DOWN => Self::L_UP,
            Self::L_LEFT => Self::L_RIGHT,
            Self::L_RIGHT => Self::L_LEFT,
            Self::R_UP => Self::R_DOWN,
            Self::R_DOWN => Self::R_UP,
            Self::R_LEFT => Self::R_RIGHT,
            Self::R_RIGHT => Self::R_LEFT,
            _ => return None,
        };
        Some(opposite)
    }

    /// Human-readable name used in config files and logs
    pub fn name(self) -> Option<&'static str> {
        BUTTON_NAMES
            .iter()
            .find(|(code, _)| *code == self)
            .map(|(_, name)| *name)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        BUTTON_NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(code, _)| *code)
    }
}

impl fmt::Display for ButtonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "button #{}", self.0),
        }
    }
}

const BUTTON_NAMES: &[(ButtonCode, &str)] = &[
    (ButtonCode::BACK, "back"),
    (ButtonCode::DPAD_UP, "dpad_up"),
    (ButtonCode::DPAD_DOWN, "dpad_down"),
    (ButtonCode::DPAD_LEFT, "dpad_left"),
    (ButtonCode::DPAD_RIGHT, "dpad_right"),
    (ButtonCode::CROSS, "cross"),
    (ButtonCode::CIRCLE, "circle"),
    (ButtonCode::SQUARE, "square"),
    (ButtonCode::TRIANGLE, "triangle"),
    (ButtonCode::L1, "l1"),
    (ButtonCode::R1, "r1"),
    (ButtonCode::L2, "l2"),
    (ButtonCode::R2, "r2"),
    (ButtonCode::L3, "l3"),
    (ButtonCode::R3, "r3"),
    (ButtonCode::START, "start"),
    (ButtonCode::SELECT, "select"),
    (ButtonCode::L_UP, "left_stick_up"),
    (ButtonCode::L_RIGHT, "left_stick_right"),
    (ButtonCode::L_DOWN, "left_stick_down"),
    (ButtonCode::L_LEFT, "left_stick_left"),
    (ButtonCode::R_UP, "right_stick_up"),
    (ButtonCode::R_RIGHT, "right_stick_right"),
    (ButtonCode::R_DOWN, "right_stick_down"),
    (ButtonCode::R_LEFT, "right_stick_left"),
];

/// Nominal touch magnitude for a percentage of [`TOUCH_MAGNITUDE_SCALE`]
pub fn nominal_magnitude(percent: f32) -> i32 {
    let percent = percent.clamp(0.0, 100.0);
    ((percent * TOUCH_MAGNITUDE_SCALE as f32 / 100.0) as i32).min(AXIS_MAX)
}
