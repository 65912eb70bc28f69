//! Input router
//!
//! Normalizes touch controls and physical device events into canonical
//! [`ButtonEvent`]s and sends them straight to the VM. Routing never touches session
//! state; a back request is reported to the caller instead of acted on.

mod device;
mod touch;

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use super::InputConfig;
use super::codes::{ButtonCode, nominal_magnitude};
use super::event::ButtonEvent;
use super::touch::TouchControl;
use crate::vm::VmHandle;

/// What the router did with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// This many canonical events were sent to the VM
    Forwarded(usize),
    /// Auto-repeat from a gamepad; dropped
    Suppressed,
    /// Back key from a non-gamepad source; the caller should end the session
    BackRequested,
    /// Not an event the VM cares about
    Ignored,
}

impl RouteOutcome {
    fn from_count(count: usize) -> Self {
        if count == 0 {
            Self::Ignored
        } else {
            Self::Forwarded(count)
        }
    }
}

pub struct InputRouter<V: VmHandle> {
    vm: Arc<V>,

    /// Magnitude sent for axis codes driven by digital sources
    touch_magnitude: i32,

    stick_deadzone: f32,

    /// Codes pressed by each touch control on touch-down
    touch_pressed: HashMap<TouchControl, SmallVec<[ButtonCode; 2]>>,

    /// Axis directions currently held by physical devices, keyed by device id
    axis_held: HashSet<(u32, ButtonCode)>,

    /// Gamepad keys forwarded down and not yet up, keyed by device id
    keys_held: HashSet<(u32, ButtonCode)>,
}

impl<V: VmHandle> InputRouter<V> {
    pub fn new(vm: Arc<V>, config: &InputConfig) -> Self {
        Self {
            vm,
            touch_magnitude: nominal_magnitude(config.touch_magnitude_percent),
            stick_deadzone: config.stick_deadzone.clamp(0.0, 0.99),
            touch_pressed: HashMap::new(),
            axis_held: HashSet::new(),
            keys_held: HashSet::new(),
        }
    }

    /// Magnitude used for axis codes pressed from touch or keys
    pub fn touch_magnitude(&self) -> i32 {
        self.touch_magnitude
    }

    /// Release everything held by touch controls, gamepad keys and physical axes.
    ///
    /// Used when the host loses focus so no button or direction stays latched while
    /// device input is frozen.
    pub fn release_all(&mut self) -> RouteOutcome {
        let mut sent = 0;
        let touches: Vec<_> = self.touch_pressed.drain().collect();
        for (_, codes) in touches {
            for code in codes {
                self.send(ButtonEvent::release(code));
                sent += 1;
            }
        }
        let held: Vec<_> = self.axis_held.drain().chain(self.keys_held.drain()).collect();
        for (_, code) in held {
            self.send(ButtonEvent::release(code));
            sent += 1;
        }
        RouteOutcome::from_count(sent)
    }

    fn send(&self, event: ButtonEvent) {
        tracing::trace!(
            "pad {} {} (magnitude {})",
            event.code,
            if event.pressed { "down" } else { "up" },
            event.magnitude
        );
        self.vm.set_button(event);
    }

    fn press_magnitude(&self, code: ButtonCode) -> i32 {
        if code.is_axis() { self.touch_magnitude } else { 0 }
    }
}
