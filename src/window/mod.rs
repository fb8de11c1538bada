//! Window entities: one per backend-owned top-level window.
//!
//! An entity caches the last known window state and exposes the async
//! round-trips the grouping engine drives. The cache is updated from
//! successful round-trip replies and from unsolicited backend events routed
//! through the desktop model; it is never authoritative over the live
//! window.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::actor::broadcast::Signal;
use crate::common::geometry::Rect;
use crate::model::TabGroupId;
use crate::model::snap_group::SnapGroup;
use crate::sys::window_server::{ServerError, ServerHandle};

new_key_type! {
    pub struct WindowId;
}

/// Stable identity a window keeps across restarts; the key for persisted
/// tab properties. The slotmap [`WindowId`] is the canonical in-process id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowIdentity {
    pub owner: String,
    pub name: String,
}

impl WindowIdentity {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        WindowIdentity {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for WindowIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayState {
    Normal,
    Minimized,
    Maximized,
}

bitflags::bitflags! {
    /// What changed in a user-driven transform.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TransformMask: u8 {
        const MOVE = 1;
        const RESIZE = 2;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowState {
    pub frame: Rect,
    pub display: DisplayState,
    pub frame_decorated: bool,
    pub hidden: bool,
    pub title: String,
    pub icon: String,
}

impl WindowState {
    pub fn merge(&mut self, delta: &PropertyDelta) {
        if let Some(center) = delta.center {
            self.frame.center = center;
        }
        if let Some(half_size) = delta.half_size {
            self.frame.half_size = half_size;
        }
        if let Some(display) = delta.display {
            self.display = display;
        }
        if let Some(hidden) = delta.hidden {
            self.hidden = hidden;
        }
        if let Some(frame_decorated) = delta.frame_decorated {
            self.frame_decorated = frame_decorated;
        }
        if let Some(title) = &delta.title {
            self.title = title.clone();
        }
        if let Some(icon) = &delta.icon {
            self.icon = icon.clone();
        }
    }
}

/// Partial window-state update; unset fields are left alone by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyDelta {
    pub center: Option<crate::common::geometry::Point>,
    pub half_size: Option<crate::common::geometry::Point>,
    pub display: Option<DisplayState>,
    pub hidden: Option<bool>,
    pub frame_decorated: Option<bool>,
    pub title: Option<String>,
    pub icon: Option<String>,
}

impl PropertyDelta {
    pub fn bounds(rect: Rect) -> Self {
        PropertyDelta {
            center: Some(rect.center),
            half_size: Some(rect.half_size),
            ..Default::default()
        }
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    pub fn frame_decorated(mut self, frame_decorated: bool) -> Self {
        self.frame_decorated = Some(frame_decorated);
        self
    }

    pub fn display(mut self, display: DisplayState) -> Self {
        self.display = Some(display);
        self
    }
}

pub struct WindowEntity {
    id: WindowId,
    identity: WindowIdentity,
    server: ServerHandle,
    state: RefCell<WindowState>,
    ready: Cell<bool>,
    alive: Cell<bool>,
    /// Owning tab group, stored as an id resolved through the desktop model.
    tab_group: Cell<Option<TabGroupId>>,
    snap_group: RefCell<Rc<SnapGroup>>,
    pub on_teardown: Signal<WindowId>,
    pub on_transform: Signal<TransformMask>,
    pub on_modified: Signal<WindowId>,
    pub on_commit: Signal<WindowId>,
}

impl fmt::Debug for WindowEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowEntity")
            .field("id", &self.id)
            .field("identity", &self.identity)
            .field("alive", &self.alive.get())
            .finish_non_exhaustive()
    }
}

impl WindowEntity {
    pub fn new(
        id: WindowId,
        identity: WindowIdentity,
        server: ServerHandle,
        state: WindowState,
        snap_group: Rc<SnapGroup>,
    ) -> Rc<Self> {
        snap_group.insert(id);
        Rc::new(WindowEntity {
            id,
            identity,
            server,
            state: RefCell::new(state),
            ready: Cell::new(true),
            alive: Cell::new(true),
            tab_group: Cell::new(None),
            snap_group: RefCell::new(snap_group),
            on_teardown: Signal::new(),
            on_transform: Signal::new(),
            on_modified: Signal::new(),
            on_commit: Signal::new(),
        })
    }

    pub fn id(&self) -> WindowId { self.id }

    pub fn identity(&self) -> &WindowIdentity { &self.identity }

    /// Cloned snapshot of the cached state. Callers hold no borrow across
    /// awaits this way.
    pub fn current_state(&self) -> WindowState { self.state.borrow().clone() }

    pub fn frame(&self) -> Rect { self.state.borrow().frame }

    pub fn is_ready(&self) -> bool { self.ready.get() }

    pub fn is_alive(&self) -> bool { self.alive.get() }

    pub fn tab_group(&self) -> Option<TabGroupId> { self.tab_group.get() }

    pub fn set_tab_group(&self, group: Option<TabGroupId>) { self.tab_group.set(group); }

    pub fn snap_group(&self) -> Rc<SnapGroup> { self.snap_group.borrow().clone() }

    /// Moves this window into `group`, leaving its previous movement group.
    pub fn set_snap_group(&self, group: Rc<SnapGroup>) {
        let previous = self.snap_group.replace(group.clone());
        if !Rc::ptr_eq(&previous, &group) {
            previous.remove(self.id);
            group.insert(self.id);
        }
    }

    pub async fn apply_properties(&self, delta: PropertyDelta) -> Result<(), ServerError> {
        if !self.alive.get() {
            return Err(ServerError::WindowGone(self.id));
        }
        self.server.apply_properties(self.id, delta.clone()).await?;
        self.state.borrow_mut().merge(&delta);
        Ok(())
    }

    pub async fn bring_to_front(&self) -> Result<(), ServerError> {
        if !self.alive.get() {
            return Err(ServerError::WindowGone(self.id));
        }
        self.server.bring_to_front(self.id).await
    }

    /// Refreshes cached geometry from the live window.
    pub async fn sync(&self) -> Result<(), ServerError> {
        if !self.alive.get() {
            return Err(ServerError::WindowGone(self.id));
        }
        let frame = self.server.sync(self.id).await?;
        self.state.borrow_mut().frame = frame;
        Ok(())
    }

    /// Refreshes the whole cached state from the live window.
    pub async fn refresh(&self) -> Result<(), ServerError> {
        if !self.alive.get() {
            return Err(ServerError::WindowGone(self.id));
        }
        let state = self.server.refresh(self.id).await?;
        *self.state.borrow_mut() = state;
        Ok(())
    }

    pub async fn close(&self) -> Result<(), ServerError> {
        if !self.alive.get() {
            return Ok(());
        }
        self.server.close(self.id).await?;
        self.mark_torn_down();
        Ok(())
    }

    pub async fn notify(&self, event: crate::group::events::TabEvent) -> Result<(), ServerError> {
        if !self.alive.get() {
            return Err(ServerError::WindowGone(self.id));
        }
        self.server.deliver(self.id, event).await
    }

    /// Idempotent: the first call flips `alive` and fires `on_teardown`.
    pub fn mark_torn_down(&self) {
        if self.alive.replace(false) {
            self.ready.set(false);
            self.on_teardown.emit(&self.id);
        }
    }

    /// Backend told us the user moved or resized this window.
    pub(crate) fn note_external_transform(&self, frame: Rect, mask: TransformMask) {
        self.state.borrow_mut().frame = frame;
        self.on_transform.emit(&mask);
    }

    pub(crate) fn note_external_modified(&self, title: Option<String>, icon: Option<String>) {
        {
            let mut state = self.state.borrow_mut();
            if let Some(title) = title {
                state.title = title;
            }
            if let Some(icon) = icon {
                state.icon = icon;
            }
        }
        self.on_modified.emit(&self.id);
    }

    pub(crate) fn note_commit(&self) { self.on_commit.emit(&self.id); }
}
