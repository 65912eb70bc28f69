//! Touch control routing

use crate::input::event::{ButtonEvent, TouchAction};
use crate::input::touch::TouchControl;
use crate::vm::VmHandle;

use super::{InputRouter, RouteOutcome};

impl<V: VmHandle> InputRouter<V> {
    /// Route a touch on an on-screen control.
    ///
    /// Down presses every code of the control; up and cancel release exactly the codes
    /// the matching down pressed.
    pub fn touch(&mut self, control: TouchControl, action: TouchAction) -> RouteOutcome {
        match action {
            TouchAction::Down => {
                let codes = control.codes();
                for &code in &codes {
                    self.send(ButtonEvent::press(code, self.press_magnitude(code)));
                }
                let count = codes.len();
                self.touch_pressed.insert(control, codes);
                RouteOutcome::from_count(count)
            }
            TouchAction::Up | TouchAction::Cancel => {
                // Nothing to release without a matching down (or after release_all)
                let Some(codes) = self.touch_pressed.remove(&control) else {
                    return RouteOutcome::Ignored;
                };
                for &code in &codes {
                    self.send(ButtonEvent::release(code));
                }
                RouteOutcome::from_count(codes.len())
            }
            TouchAction::Move => RouteOutcome::Ignored,
        }
    }
}
