//! Attached HID device manager
//!
//! Physical controller polling is suspended while the host is backgrounded. The session
//! controller freezes the manager on `pause`, unfreezes it on `resume`, and releases it at
//! teardown.

use crate::input::{KeyEvent, MotionEvent};

/// Raw event produced by a physical device
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    Key(KeyEvent),
    Motion(MotionEvent),
}

pub trait DeviceManager: Send {
    /// Suspend (`true`) or resume (`false`) device polling
    fn set_frozen(&mut self, frozen: bool);

    /// Drain pending device events. A frozen manager returns nothing.
    fn poll(&mut self) -> Vec<DeviceEvent> {
        Vec::new()
    }

    /// Give up the underlying devices. No further events are produced.
    fn release(&mut self);
}
