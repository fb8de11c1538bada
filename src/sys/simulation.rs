//! In-process simulated window server.
//!
//! Stands in for the real window manager behind the request protocol: it
//! keeps per-window state and a z-order, answers every round-trip, and can
//! inject latency and failures. The daemon runs against it when no real
//! backend is attached; the scenario tests drive the whole grouping engine
//! through it.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::actor;
use crate::common::collections::HashMap;
use crate::group::events::TabEvent;
use crate::sys::window_server::{Reply, Request, ServerError, ServerHandle, WindowSpec};
use crate::window::{PropertyDelta, WindowId, WindowState};

#[derive(Default)]
struct SimState {
    windows: HashMap<WindowId, WindowState>,
    z_order: Vec<WindowId>,
    delivered: HashMap<WindowId, Vec<TabEvent>>,
    latency: Option<Duration>,
    failures: Vec<FailureRule>,
}

struct FailureRule {
    target: WindowId,
    operation: &'static str,
}

/// Shared control surface over the simulation, for the code that sets it up
/// and for tests that want to inspect or sabotage it.
#[derive(Clone, Default)]
pub struct SimControl(Rc<RefCell<SimState>>);

impl SimControl {
    /// Seeds a window the backend already owns, without going through
    /// `Request::Create`.
    pub fn seed_window(&self, id: WindowId, state: WindowState) {
        let mut sim = self.0.borrow_mut();
        sim.windows.insert(id, state);
        sim.z_order.push(id);
    }

    pub fn window_state(&self, id: WindowId) -> Option<WindowState> {
        self.0.borrow().windows.get(&id).cloned()
    }

    pub fn frontmost(&self) -> Option<WindowId> { self.0.borrow().z_order.last().copied() }

    /// Notifications delivered into a window's process, oldest first.
    pub fn delivered(&self, id: WindowId) -> Vec<TabEvent> {
        self.0.borrow().delivered.get(&id).cloned().unwrap_or_default()
    }

    pub fn set_latency(&self, latency: Option<Duration>) {
        self.0.borrow_mut().latency = latency;
    }

    /// The next `operation` round-trip against `target` fails once.
    pub fn fail_next(&self, target: WindowId, operation: &'static str) {
        self.0.borrow_mut().failures.push(FailureRule { target, operation });
    }

    fn take_failure(&self, target: WindowId, operation: &str) -> bool {
        let mut sim = self.0.borrow_mut();
        if let Some(pos) = sim
            .failures
            .iter()
            .position(|rule| rule.target == target && rule.operation == operation)
        {
            sim.failures.remove(pos);
            return true;
        }
        false
    }
}

pub struct SimServer {
    control: SimControl,
    rx: actor::Receiver<Request>,
}

impl SimServer {
    /// Builds the server plus the handle entities talk through.
    pub fn new() -> (Self, ServerHandle, SimControl) {
        let (tx, rx) = actor::channel();
        let control = SimControl::default();
        let server = SimServer {
            control: control.clone(),
            rx,
        };
        (server, ServerHandle::new(tx), control)
    }

    pub async fn run(mut self) {
        while let Some((span, request)) = self.rx.recv().await {
            let _guard = span.enter();
            self.handle_request(request).await;
        }
        debug!("window server request stream ended");
    }

    #[instrument(name = "sim::handle_request", skip_all)]
    async fn handle_request(&mut self, request: Request) {
        let latency = self.control.0.borrow().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match request {
            Request::ApplyProperties { id, delta, reply } => {
                self.answer(id, "apply_properties", reply, |control| {
                    control.apply_properties(id, &delta)
                });
            }
            Request::BringToFront { id, reply } => {
                self.answer(id, "bring_to_front", reply, |control| {
                    control.raise(id)
                });
            }
            Request::Sync { id, reply } => {
                self.answer(id, "sync", reply, |control| {
                    control
                        .window_state(id)
                        .map(|state| state.frame)
                        .ok_or(ServerError::WindowGone(id))
                });
            }
            Request::Refresh { id, reply } => {
                self.answer(id, "refresh", reply, |control| {
                    control.window_state(id).ok_or(ServerError::WindowGone(id))
                });
            }
            Request::Close { id, reply } => {
                self.answer(id, "close", reply, |control| control.remove(id));
            }
            Request::Deliver { id, event, reply } => {
                self.answer(id, "deliver", reply, |control| control.deliver(id, event));
            }
            Request::Create { id, spec, reply } => {
                let state = self.control.create(id, spec);
                let _ = reply.send(Ok(state));
            }
        }
    }

    fn answer<T>(
        &self,
        id: WindowId,
        operation: &'static str,
        reply: Reply<T>,
        op: impl FnOnce(&SimControl) -> Result<T, ServerError>,
    ) {
        let result = if self.control.take_failure(id, operation) {
            Err(ServerError::Rejected(format!("injected {operation} failure")))
        } else {
            op(&self.control)
        };
        let _ = reply.send(result);
    }
}

impl SimControl {
    fn apply_properties(&self, id: WindowId, delta: &PropertyDelta) -> Result<(), ServerError> {
        let mut sim = self.0.borrow_mut();
        let state = sim.windows.get_mut(&id).ok_or(ServerError::WindowGone(id))?;
        state.merge(delta);
        Ok(())
    }

    fn raise(&self, id: WindowId) -> Result<(), ServerError> {
        let mut sim = self.0.borrow_mut();
        if !sim.windows.contains_key(&id) {
            return Err(ServerError::WindowGone(id));
        }
        sim.z_order.retain(|w| *w != id);
        sim.z_order.push(id);
        Ok(())
    }

    fn remove(&self, id: WindowId) -> Result<(), ServerError> {
        let mut sim = self.0.borrow_mut();
        sim.windows.remove(&id).ok_or(ServerError::WindowGone(id))?;
        sim.z_order.retain(|w| *w != id);
        Ok(())
    }

    fn deliver(&self, id: WindowId, event: TabEvent) -> Result<(), ServerError> {
        let mut sim = self.0.borrow_mut();
        if !sim.windows.contains_key(&id) {
            return Err(ServerError::WindowGone(id));
        }
        sim.delivered.entry(id).or_default().push(event);
        Ok(())
    }

    fn create(&self, id: WindowId, spec: WindowSpec) -> WindowState {
        let state = WindowState {
            frame: spec.frame,
            display: crate::window::DisplayState::Normal,
            frame_decorated: spec.frame_decorated,
            hidden: spec.hidden,
            title: spec.title,
            icon: String::new(),
        };
        self.seed_window(id, state.clone());
        state
    }
}
