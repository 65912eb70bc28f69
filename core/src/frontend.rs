//! Host boundary
//!
//! [`Frontend`] ties the session controller, surface adapter and input router to the
//! host's lifecycle. Hosts either call [`Frontend::handle`] from their UI thread or post
//! [`HostEvent`]s through a bounded [`channel`] drained by [`Frontend::run`]; both keep a
//! single thread writing session state.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::time::Duration;

use crate::input::{
    InputConfig, InputRouter, KeyEvent, MotionEvent, RouteOutcome, TouchAction, TouchControl,
};
use crate::session::{SessionController, TeardownReport};
use crate::surface::SurfaceLifecycle;
use crate::vm::{AspectRatio, RenderBackend, SurfaceHandle, VmHandle};

/// Lifecycle, surface and input notifications from the host
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    ForegroundEnter,
    ForegroundExit,
    SurfaceChanged {
        surface: Option<SurfaceHandle>,
        width: u32,
        height: u32,
    },
    SurfaceDestroyed,
    Touch {
        control: TouchControl,
        action: TouchAction,
    },
    Key(KeyEvent),
    Motion(MotionEvent),
    SaveState(i32),
    LoadState(i32),
    Restart(PathBuf),
    SetRenderBackend(RenderBackend),
    SetAspectRatio(AspectRatio),
    Destroy,
}

/// What the host should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction {
    Continue,
    /// The session is torn down; the host should exit
    Terminate,
}

pub struct Frontend<V: VmHandle> {
    session: SessionController<V>,
    surface: SurfaceLifecycle,
    router: InputRouter<V>,
    teardown: Option<TeardownReport>,
}

impl<V: VmHandle> Frontend<V> {
    pub fn new(session: SessionController<V>, input: &InputConfig) -> Self {
        let router = InputRouter::new(session.vm().clone(), input);
        Self {
            session,
            surface: SurfaceLifecycle::new(),
            router,
            teardown: None,
        }
    }

    pub fn session(&self) -> &SessionController<V> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionController<V> {
        &mut self.session
    }

    pub fn surface(&self) -> &SurfaceLifecycle {
        &self.surface
    }

    pub fn router_mut(&mut self) -> &mut InputRouter<V> {
        &mut self.router
    }

    pub fn is_terminated(&self) -> bool {
        self.teardown.is_some()
    }

    /// Dispatch one host event synchronously
    pub fn handle(&mut self, event: HostEvent) -> HostAction {
        if self.teardown.is_some() {
            return HostAction::Terminate;
        }

        match event {
            HostEvent::ForegroundEnter => self.session.resume(),
            HostEvent::ForegroundExit => {
                self.router.release_all();
                self.session.pause();
            }
            HostEvent::SurfaceChanged {
                surface,
                width,
                height,
            } => {
                if let Err(e) =
                    self.surface
                        .on_surface_changed(&mut self.session, surface, width, height)
                {
                    tracing::error!("Failed to start session on surface attach: {}", e);
                }
            }
            HostEvent::SurfaceDestroyed => self.surface.on_surface_destroyed(&mut self.session),
            HostEvent::Touch { control, action } => {
                self.router.touch(control, action);
            }
            HostEvent::Key(key) => {
                let outcome = self.router.key(key);
                return self.after_route(outcome);
            }
            HostEvent::Motion(motion) => {
                self.router.motion(&motion);
            }
            HostEvent::SaveState(slot) => {
                self.session.save_to_slot(slot);
            }
            HostEvent::LoadState(slot) => {
                self.session.load_from_slot(slot);
            }
            HostEvent::Restart(rom) => {
                if let Err(e) = self.session.restart(rom) {
                    tracing::error!("Restart failed: {}", e);
                }
            }
            HostEvent::SetRenderBackend(backend) => self.session.set_render_backend(backend),
            HostEvent::SetAspectRatio(ratio) => self.session.set_aspect_ratio(ratio),
            HostEvent::Destroy => {
                self.teardown();
                return HostAction::Terminate;
            }
        }
        HostAction::Continue
    }

    /// Route whatever the attached device manager has queued
    pub fn poll_devices(&mut self) -> HostAction {
        let events = match self.session.device_manager_mut() {
            Some(devices) => devices.poll(),
            None => return HostAction::Continue,
        };
        for event in events {
            let outcome = self.router.route_device(event);
            if self.after_route(outcome) == HostAction::Terminate {
                return HostAction::Terminate;
            }
        }
        HostAction::Continue
    }

    /// Drain `events` until the session terminates or every sender is gone, polling
    /// devices between events. Tears the session down before returning.
    pub fn run(&mut self, events: &EventReceiver, poll_interval: Duration) -> TeardownReport {
        loop {
            let action = match events.0.recv_timeout(poll_interval) {
                Ok(event) => self.handle(event),
                Err(RecvTimeoutError::Timeout) => self.poll_devices(),
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::info!("Host event channel closed");
                    break;
                }
            };
            if action == HostAction::Terminate {
                break;
            }
        }
        self.teardown()
    }

    /// Tear the session down once; later calls return the first report
    pub fn teardown(&mut self) -> TeardownReport {
        if let Some(report) = &self.teardown {
            return report.clone();
        }
        let report = self.session.teardown();
        self.teardown = Some(report.clone());
        report
    }

    fn after_route(&mut self, outcome: RouteOutcome) -> HostAction {
        if outcome == RouteOutcome::BackRequested {
            tracing::info!("Back requested, ending session");
            self.teardown();
            return HostAction::Terminate;
        }
        HostAction::Continue
    }
}

/// Posting side of a frontend event channel
#[derive(Debug, Clone)]
pub struct EventSender(SyncSender<HostEvent>);

impl EventSender {
    /// Block until there is room. Returns `false` once the frontend is gone.
    pub fn send(&self, event: HostEvent) -> bool {
        self.0.send(event).is_ok()
    }

    /// Post without blocking; hands the event back if the queue is full or closed
    pub fn try_send(&self, event: HostEvent) -> Result<(), HostEvent> {
        self.0.try_send(event).map_err(|e| match e {
            TrySendError::Full(event) | TrySendError::Disconnected(event) => event,
        })
    }
}

/// Receiving side, drained by [`Frontend::run`]
#[derive(Debug)]
pub struct EventReceiver(Receiver<HostEvent>);

/// Bounded host event queue
pub fn channel(capacity: usize) -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::sync_channel(capacity.max(1));
    (EventSender(tx), EventReceiver(rx))
}
