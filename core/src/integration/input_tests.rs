//! Input routing through the frontend (touch, keys, sticks, back)

use std::sync::Arc;

use crate::frontend::{HostAction, HostEvent};
use crate::headless::HeadlessVm;
use crate::input::{
    ButtonCode, ButtonEvent, InputSource, KeyAction, KeyEvent, MotionEvent, StickAxis,
    StickZone, TouchAction, TouchControl, nominal_magnitude,
};
use crate::session::DeviceEvent;
use crate::test_utils::{TestDeviceManager, TestVm};

use super::test_utils::*;

fn touch(control: TouchControl, action: TouchAction) -> HostEvent {
    HostEvent::Touch { control, action }
}

// ============================================================================
// Touch
// ============================================================================

/// Diagonal zones press and release exactly their two axis codes
#[test]
fn test_zone_release_matches_press() {
    let vm = Arc::new(TestVm::new());
    let mut frontend = new_frontend(vm.clone());
    let magnitude = nominal_magnitude(90.0);

    for zone in [StickZone::UpperLeft, StickZone::LowerRight] {
        for end in [TouchAction::Up, TouchAction::Cancel] {
            vm.clear_calls();
            frontend.handle(touch(TouchControl::Zone(zone), TouchAction::Down));
            frontend.handle(touch(TouchControl::Zone(zone), end));

            let codes = zone.codes();
            let mut expected: Vec<ButtonEvent> = codes
                .iter()
                .map(|&code| ButtonEvent::press(code, magnitude))
                .collect();
            expected.extend(codes.iter().map(|&code| ButtonEvent::release(code)));
            assert_eq!(vm.buttons(), expected);
        }
    }
}

/// Touch reaches the headless engine's pad state
#[test]
fn test_touch_reaches_engine_pad() {
    let vm = Arc::new(HeadlessVm::new());
    let mut frontend = new_frontend(vm.clone());
    let zone = TouchControl::Zone(StickZone::Upper);

    frontend.handle(touch(zone, TouchAction::Down));
    frontend.handle(touch(TouchControl::Button(ButtonCode::START), TouchAction::Down));
    assert_eq!(vm.pad_state(ButtonCode::L_UP), Some(29489));
    assert_eq!(vm.pad_state(ButtonCode::START), Some(0));

    frontend.handle(touch(zone, TouchAction::Up));
    assert_eq!(vm.pad_state(ButtonCode::L_UP), None);
    assert_eq!(vm.pad_state(ButtonCode::START), Some(0));
}

/// Backgrounding releases whatever touch left pressed
#[test]
fn test_foreground_exit_releases_touch() {
    let vm = Arc::new(HeadlessVm::new());
    let mut frontend = new_frontend(vm.clone());

    frontend.handle(touch(TouchControl::Zone(StickZone::LowerLeft), TouchAction::Down));
    frontend.handle(HostEvent::ForegroundExit);

    assert_eq!(vm.pad_state(ButtonCode::L_LEFT), None);
    assert_eq!(vm.pad_state(ButtonCode::L_DOWN), None);
}

// ============================================================================
// Keys
// ============================================================================

/// Held-key auto-repeat produces one press and one release
#[test]
fn test_auto_repeat_suppressed() {
    let vm = Arc::new(TestVm::new());
    let mut frontend = new_frontend(vm.clone());

    frontend.handle(HostEvent::Key(KeyEvent::gamepad(ButtonCode::CROSS, KeyAction::Down)));
    for repeat in 1..=10 {
        frontend.handle(HostEvent::Key(
            KeyEvent::gamepad(ButtonCode::CROSS, KeyAction::Down).with_repeat(repeat),
        ));
    }
    frontend.handle(HostEvent::Key(KeyEvent::gamepad(ButtonCode::CROSS, KeyAction::Up)));

    assert_eq!(
        vm.buttons(),
        vec![
            ButtonEvent::press(ButtonCode::CROSS, 0),
            ButtonEvent::release(ButtonCode::CROSS)
        ]
    );
}

/// Back from the system keyboard ends the session; from a gamepad it is a pad button
#[test]
fn test_back_key_source_decides() {
    let vm = Arc::new(TestVm::new());
    let mut frontend = new_frontend(vm.clone());
    frontend.handle(surface_changed(1));
    assert!(vm.wait_for_active_runs(1, WAIT));

    let pad_back = KeyEvent::gamepad(ButtonCode::BACK, KeyAction::Down);
    assert_eq!(frontend.handle(HostEvent::Key(pad_back)), HostAction::Continue);
    assert!(frontend.session().is_thread_alive());
    assert_eq!(vm.buttons().len(), 1);

    let system_back = pad_back.with_source(InputSource::KEYBOARD);
    assert_eq!(frontend.handle(HostEvent::Key(system_back)), HostAction::Terminate);
    assert!(frontend.is_terminated());
    assert_eq!(vm.active_runs(), 0);
}

/// Non-gamepad keys other than back are dropped
#[test]
fn test_keyboard_keys_not_forwarded() {
    let vm = Arc::new(TestVm::new());
    let mut frontend = new_frontend(vm.clone());

    let key = KeyEvent::gamepad(ButtonCode::CROSS, KeyAction::Down)
        .with_source(InputSource::KEYBOARD);
    assert_eq!(frontend.handle(HostEvent::Key(key)), HostAction::Continue);
    assert!(vm.buttons().is_empty());
}

// ============================================================================
// Physical devices
// ============================================================================

/// Stick motion polled from a device manager presses and releases axis codes
#[test]
fn test_device_stick_motion() {
    let vm = Arc::new(HeadlessVm::new());
    let mut frontend = new_frontend(vm.clone());
    let devices = TestDeviceManager::new();
    frontend
        .session_mut()
        .attach_device_manager(Box::new(devices.clone()));

    devices.push(DeviceEvent::Motion(MotionEvent::gamepad([(
        StickAxis::LeftX,
        1.0,
    )])));
    frontend.poll_devices();
    assert_eq!(vm.pad_state(ButtonCode::L_RIGHT), Some(32767));

    devices.push(DeviceEvent::Motion(MotionEvent::gamepad([(
        StickAxis::LeftX,
        -1.0,
    )])));
    frontend.poll_devices();
    assert_eq!(vm.pad_state(ButtonCode::L_RIGHT), None);
    assert_eq!(vm.pad_state(ButtonCode::L_LEFT), Some(32767));

    devices.push(DeviceEvent::Motion(MotionEvent::gamepad([(
        StickAxis::LeftX,
        0.05,
    )])));
    frontend.poll_devices();
    assert_eq!(vm.pad_state(ButtonCode::L_LEFT), None);
}

/// Devices freeze while backgrounded and are released at teardown
#[test]
fn test_device_manager_lifecycle() {
    let vm = Arc::new(TestVm::new());
    let mut frontend = new_frontend(vm.clone());
    let devices = TestDeviceManager::new();
    frontend
        .session_mut()
        .attach_device_manager(Box::new(devices.clone()));

    frontend.handle(HostEvent::ForegroundExit);
    frontend.handle(HostEvent::ForegroundEnter);
    frontend.handle(HostEvent::Destroy);

    assert_eq!(devices.frozen_calls(), vec![true, false]);
    assert_eq!(devices.released(), 1);
}

/// A pad button held when the host backgrounds is released, not left latched
#[test]
fn test_foreground_exit_releases_held_device_button() {
    let vm = Arc::new(HeadlessVm::new());
    let mut frontend = new_frontend(vm.clone());
    let devices = TestDeviceManager::new();
    frontend
        .session_mut()
        .attach_device_manager(Box::new(devices.clone()));

    devices.push(DeviceEvent::Key(KeyEvent::gamepad(
        ButtonCode::CROSS,
        KeyAction::Down,
    )));
    frontend.poll_devices();
    assert_eq!(vm.pad_state(ButtonCode::CROSS), Some(0));

    // The button comes up while device input is frozen; that release never arrives
    frontend.handle(HostEvent::ForegroundExit);
    assert_eq!(vm.pad_state(ButtonCode::CROSS), None);
    frontend.handle(HostEvent::ForegroundEnter);
    frontend.poll_devices();
    assert_eq!(vm.pad_state(ButtonCode::CROSS), None);
}

/// A back key from a device manager terminates like one from the host
#[test]
fn test_device_back_terminates() {
    let vm = Arc::new(TestVm::new());
    let mut frontend = new_frontend(vm.clone());
    let devices = TestDeviceManager::new();
    frontend
        .session_mut()
        .attach_device_manager(Box::new(devices.clone()));

    devices.push(DeviceEvent::Key(
        KeyEvent::gamepad(ButtonCode::BACK, KeyAction::Down).with_source(InputSource::KEYBOARD),
    ));
    assert_eq!(frontend.poll_devices(), HostAction::Terminate);
    assert!(frontend.is_terminated());
}
