//! Request/event contract between window entities and whatever owns the
//! real windows.
//!
//! Every mutation is a round-trip: the request carries a oneshot reply and
//! the caller suspends until the owning side confirms. Windows live in
//! other processes in a real deployment, so none of this is assumed to be
//! fast or ordered across windows.

use tokio::sync::oneshot;

use crate::actor;
use crate::common::geometry::Rect;
use crate::group::events::TabEvent;
use crate::window::{PropertyDelta, WindowId, WindowIdentity, WindowState};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("window {0:?} is gone")]
    WindowGone(WindowId),
    #[error("window server rejected request: {0}")]
    Rejected(String),
    #[error("window server disconnected")]
    Disconnected,
}

pub type Reply<T> = oneshot::Sender<Result<T, ServerError>>;

/// Creation parameters for a backend-owned window. Only the strip factory
/// synthesizes these; member windows always pre-exist.
#[derive(Debug, Clone)]
pub struct WindowSpec {
    pub identity: WindowIdentity,
    pub frame: Rect,
    pub frame_decorated: bool,
    pub hidden: bool,
    pub title: String,
}

#[derive(Debug)]
pub enum Request {
    ApplyProperties {
        id: WindowId,
        delta: PropertyDelta,
        reply: Reply<()>,
    },
    BringToFront {
        id: WindowId,
        reply: Reply<()>,
    },
    /// Re-read live geometry.
    Sync {
        id: WindowId,
        reply: Reply<Rect>,
    },
    /// Re-read the full live state.
    Refresh {
        id: WindowId,
        reply: Reply<WindowState>,
    },
    Close {
        id: WindowId,
        reply: Reply<()>,
    },
    /// Deliver a tab notification into the window's own process.
    Deliver {
        id: WindowId,
        event: TabEvent,
        reply: Reply<()>,
    },
    Create {
        id: WindowId,
        spec: WindowSpec,
        reply: Reply<WindowState>,
    },
}

/// Unsolicited state changes flowing back from the backend: user-driven
/// moves and resizes, external closes, title/icon changes, gesture commits.
#[derive(Debug)]
pub enum ServerEvent {
    Transformed {
        id: WindowId,
        frame: Rect,
        mask: crate::window::TransformMask,
    },
    Committed {
        id: WindowId,
    },
    Modified {
        id: WindowId,
        title: Option<String>,
        icon: Option<String>,
    },
    Closed {
        id: WindowId,
    },
}

#[derive(Clone, Debug)]
pub struct ServerHandle(actor::Sender<Request>);

impl ServerHandle {
    pub fn new(tx: actor::Sender<Request>) -> Self { ServerHandle(tx) }

    async fn call<T>(&self, build: impl FnOnce(Reply<T>) -> Request) -> Result<T, ServerError> {
        let (tx, rx) = oneshot::channel();
        self.0.send(build(tx)).map_err(|_| ServerError::Disconnected)?;
        rx.await.map_err(|_| ServerError::Disconnected)?
    }

    pub async fn apply_properties(
        &self,
        id: WindowId,
        delta: PropertyDelta,
    ) -> Result<(), ServerError> {
        self.call(|reply| Request::ApplyProperties { id, delta, reply }).await
    }

    pub async fn bring_to_front(&self, id: WindowId) -> Result<(), ServerError> {
        self.call(|reply| Request::BringToFront { id, reply }).await
    }

    pub async fn sync(&self, id: WindowId) -> Result<Rect, ServerError> {
        self.call(|reply| Request::Sync { id, reply }).await
    }

    pub async fn refresh(&self, id: WindowId) -> Result<WindowState, ServerError> {
        self.call(|reply| Request::Refresh { id, reply }).await
    }

    pub async fn close(&self, id: WindowId) -> Result<(), ServerError> {
        self.call(|reply| Request::Close { id, reply }).await
    }

    pub async fn deliver(&self, id: WindowId, event: TabEvent) -> Result<(), ServerError> {
        self.call(|reply| Request::Deliver { id, event, reply }).await
    }

    pub async fn create(&self, id: WindowId, spec: WindowSpec) -> Result<WindowState, ServerError> {
        self.call(|reply| Request::Create { id, spec, reply }).await
    }
}
