//! Physical device routing: keys, stick motion and deadzone

use crate::input::codes::{AXIS_MAX, ButtonCode};
use crate::input::event::{ButtonEvent, KeyAction, KeyEvent, MotionEvent};
use crate::session::DeviceEvent;
use crate::vm::VmHandle;

use super::{InputRouter, RouteOutcome};

impl<V: VmHandle> InputRouter<V> {
    pub fn route_device(&mut self, event: DeviceEvent) -> RouteOutcome {
        match event {
            DeviceEvent::Key(key) => self.key(key),
            DeviceEvent::Motion(motion) => self.motion(&motion),
        }
    }

    /// Route a key event.
    ///
    /// Gamepad keys are forwarded unless they are auto-repeats. From any other source
    /// only a back key-down matters, and it is reported rather than forwarded.
    pub fn key(&mut self, event: KeyEvent) -> RouteOutcome {
        if event.source.is_gamepad() {
            if event.repeat_count != 0 {
                return RouteOutcome::Suppressed;
            }
            let held = (event.device_id, event.code);
            let button = match event.action {
                KeyAction::Down => {
                    self.keys_held.insert(held);
                    ButtonEvent::press(event.code, self.press_magnitude(event.code))
                }
                KeyAction::Up => {
                    self.keys_held.remove(&held);
                    ButtonEvent::release(event.code)
                }
            };
            self.send(button);
            return RouteOutcome::Forwarded(1);
        }

        if event.code == ButtonCode::BACK && event.action == KeyAction::Down {
            if event.repeat_count != 0 {
                return RouteOutcome::Suppressed;
            }
            tracing::debug!("Back requested from device {}", event.device_id);
            return RouteOutcome::BackRequested;
        }

        RouteOutcome::Ignored
    }

    /// Route analog stick motion from a gamepad-class device.
    ///
    /// Each axis presses the direction it leans towards with a magnitude scaled to
    /// `[0, 32767]` past the deadzone, and releases the opposite direction.
    pub fn motion(&mut self, event: &MotionEvent) -> RouteOutcome {
        if !event.source.is_gamepad() && !event.source.is_joystick() {
            return RouteOutcome::Ignored;
        }

        let mut sent = 0;
        for &(axis, raw) in &event.axes {
            let value = self.apply_stick_deadzone(raw);
            let (negative, positive) = axis.codes();

            let (toward, away) = if value < 0.0 {
                (Some(negative), [positive, negative])
            } else if value > 0.0 {
                (Some(positive), [negative, positive])
            } else {
                (None, [negative, positive])
            };

            for code in away {
                if Some(code) != toward && self.axis_held.remove(&(event.device_id, code)) {
                    self.send(ButtonEvent::release(code));
                    sent += 1;
                }
            }

            if let Some(code) = toward {
                let magnitude = ((value.abs() * AXIS_MAX as f32).round() as i32).min(AXIS_MAX);
                self.axis_held.insert((event.device_id, code));
                self.send(ButtonEvent::press(code, magnitude));
                sent += 1;
            }
        }
        RouteOutcome::from_count(sent)
    }

    /// Zero inside the deadzone, rescaled to the full range outside it
    pub(super) fn apply_stick_deadzone(&self, value: f32) -> f32 {
        let deadzone = self.stick_deadzone;
        if !value.is_finite() || value.abs() <= deadzone {
            0.0
        } else {
            let magnitude = (value.abs() - deadzone) / (1.0 - deadzone);
            value.signum() * magnitude.clamp(0.0, 1.0)
        }
    }
}
