//! Integration tests for the vmhost session layer
//!
//! Drive the frontend end to end: host lifecycle, surface attach, restart ordering and
//! input routing against both the recording test VM and the headless engine.

#[cfg(test)]
mod input_tests;

#[cfg(test)]
pub(crate) mod test_utils {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use crate::engine::Engine;
    use crate::frontend::{Frontend, HostEvent};
    use crate::input::InputConfig;
    use crate::session::{JoinPolicy, Phase, SessionController};
    use crate::vm::{SurfaceHandle, VmHandle};

    pub const WAIT: Duration = Duration::from_secs(5);

    /// Initialized frontend over `vm`, not yet attached to a surface
    pub fn new_frontend<V: VmHandle>(vm: Arc<V>) -> Frontend<V> {
        let mut session = SessionController::new(Engine::from_arc(vm), JoinPolicy::Bounded(WAIT));
        session.initialize(Path::new("/data"), 33).unwrap();
        Frontend::new(session, &InputConfig::default())
    }

    pub fn surface_changed(raw: u64) -> HostEvent {
        HostEvent::SurfaceChanged {
            surface: Some(SurfaceHandle::from_raw(raw)),
            width: 1280,
            height: 720,
        }
    }

    /// Poll until the session has no live execution thread
    pub fn wait_until_stopped<V: VmHandle>(frontend: &Frontend<V>) {
        let deadline = Instant::now() + WAIT;
        while frontend.session().is_thread_alive() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(frontend.session().phase(), Phase::Stopped);
    }

    pub fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + WAIT;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        condition()
    }
}
