//! On-screen touch controls

use smallvec::{SmallVec, smallvec};

use super::codes::ButtonCode;

/// One of the eight regions of the virtual left stick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StickZone {
    UpperLeft,
    Upper,
    UpperRight,
    Left,
    Right,
    LowerLeft,
    Lower,
    LowerRight,
}

impl StickZone {
    pub const ALL: [StickZone; 8] = [
        StickZone::UpperLeft,
        StickZone::Upper,
        StickZone::UpperRight,
        StickZone::Left,
        StickZone::Right,
        StickZone::LowerLeft,
        StickZone::Lower,
        StickZone::LowerRight,
    ];

    /// Axis codes pressed by this zone; diagonals press two
    pub fn codes(self) -> SmallVec<[ButtonCode; 2]> {
        match self {
            StickZone::UpperLeft => smallvec![ButtonCode::L_UP, ButtonCode::L_LEFT],
            StickZone::Upper => smallvec![ButtonCode::L_UP],
            StickZone::UpperRight => smallvec![ButtonCode::L_UP, ButtonCode::L_RIGHT],
            StickZone::Left => smallvec![ButtonCode::L_LEFT],
            StickZone::Right => smallvec![ButtonCode::L_RIGHT],
            StickZone::LowerLeft => smallvec![ButtonCode::L_LEFT, ButtonCode::L_DOWN],
            StickZone::Lower => smallvec![ButtonCode::L_DOWN],
            StickZone::LowerRight => smallvec![ButtonCode::L_RIGHT, ButtonCode::L_DOWN],
        }
    }
}

/// A touchable control in the on-screen layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchControl {
    Button(ButtonCode),
    Zone(StickZone),
}

impl TouchControl {
    pub fn codes(self) -> SmallVec<[ButtonCode; 2]> {
        match self {
            TouchControl::Button(code) => smallvec![code],
            TouchControl::Zone(zone) => zone.codes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonals_press_both_cardinals() {
        for zone in StickZone::ALL {
            let codes = zone.codes();
            assert!(codes.iter().all(|c| c.is_axis()));
            let expected = match zone {
                StickZone::UpperLeft
                | StickZone::UpperRight
                | StickZone::LowerLeft
                | StickZone::LowerRight => 2,
                _ => 1,
            };
            assert_eq!(codes.len(), expected, "{:?}", zone);
        }
    }

    #[test]
    fn test_zone_never_presses_opposites() {
        for zone in StickZone::ALL {
            let codes = zone.codes();
            for code in &codes {
                let opposite = code.opposite_axis().unwrap();
                assert!(!codes.contains(&opposite), "{:?}", zone);
            }
        }
    }
}
