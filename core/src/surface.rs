//! Surface lifecycle adapter
//!
//! Forwards every presentation-surface change to the VM and starts the session the
//! first time a usable surface shows up. Destruction only detaches the surface; the
//! execution thread keeps running until the session is told otherwise.

use crate::error::SessionError;
use crate::session::{Phase, SessionController, StartOutcome};
use crate::vm::{SurfaceHandle, VmHandle};

/// Last geometry reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceGeometry {
    pub surface: Option<SurfaceHandle>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Default)]
pub struct SurfaceLifecycle {
    last: Option<SurfaceGeometry>,
    starts_triggered: u32,
}

impl SurfaceLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_geometry(&self) -> Option<SurfaceGeometry> {
        self.last
    }

    /// How many times a surface notification started the session
    pub fn starts_triggered(&self) -> u32 {
        self.starts_triggered
    }

    /// Surface created or resized.
    ///
    /// Always forwarded. Returns the start outcome when this notification attempted the
    /// first start, `None` otherwise.
    pub fn on_surface_changed<V: VmHandle>(
        &mut self,
        session: &mut SessionController<V>,
        surface: Option<SurfaceHandle>,
        width: u32,
        height: u32,
    ) -> Result<Option<StartOutcome>, SessionError> {
        if session.is_torn_down() {
            return Ok(None);
        }

        tracing::debug!(
            "Surface changed: {:?} {}x{} (phase {})",
            surface,
            width,
            height,
            session.phase()
        );
        session.vm().surface_changed(surface, width, height);
        session.set_surface(surface);
        self.last = Some(SurfaceGeometry {
            surface,
            width,
            height,
        });

        if surface.is_none()
            || session.phase() != Phase::Initialized
            || session.is_thread_alive()
        {
            return Ok(None);
        }

        let outcome = session.start_selected()?;
        if outcome == StartOutcome::Started {
            self.starts_triggered += 1;
        }
        Ok(Some(outcome))
    }

    /// Surface gone: forwarded as "no surface, 0x0". Does not stop the thread.
    pub fn on_surface_destroyed<V: VmHandle>(&mut self, session: &mut SessionController<V>) {
        if session.is_torn_down() {
            return;
        }
        tracing::debug!("Surface destroyed (phase {})", session.phase());
        session.vm().surface_changed(None, 0, 0);
        session.set_surface(None);
        self.last = Some(SurfaceGeometry {
            surface: None,
            width: 0,
            height: 0,
        });
    }
}
