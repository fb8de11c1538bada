//! The desktop model: the registry every id resolves through.
//!
//! Owns the window entities, the live tab groups, the transaction table and
//! the strip pool, and pumps unsolicited backend events into the entities
//! they concern. Groups and windows reference each other by id through this
//! model, never by owning pointers.

pub mod snap_group;
pub mod transaction;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap};
use tracing::{debug, instrument, warn};

use crate::actor;
use crate::actor::broadcast::GroupSignals;
use crate::common::collections::HashMap;
use crate::common::config::Config;
use crate::common::geometry::Rect;
use crate::group::TabGroup;
use crate::group::properties::PropertyStore;
use crate::group::strip_pool::StripWindowPool;
use crate::model::snap_group::SnapGroup;
use crate::model::transaction::TxStore;
use crate::sys::window_server::{ServerError, ServerEvent, ServerHandle, WindowSpec};
use crate::window::{WindowEntity, WindowId, WindowIdentity, WindowState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabGroupId(u64);

impl fmt::Display for TabGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tabgroup-{}", self.0)
    }
}

pub struct Desktop {
    config: Config,
    server: ServerHandle,
    ids: RefCell<SlotMap<WindowId, ()>>,
    windows: RefCell<SecondaryMap<WindowId, Rc<WindowEntity>>>,
    identities: RefCell<HashMap<WindowIdentity, WindowId>>,
    groups: RefCell<HashMap<TabGroupId, Rc<TabGroup>>>,
    next_group: Cell<u64>,
    screen: Cell<Rect>,
    store: Rc<dyn PropertyStore>,
    pool: StripWindowPool,
    pub transactions: TxStore,
    pub signals: GroupSignals,
}

impl Desktop {
    pub fn new(config: Config, server: ServerHandle, store: Rc<dyn PropertyStore>) -> Rc<Self> {
        let screen = Rect::from_extent(
            0.0,
            0.0,
            config.settings.screen.width,
            config.settings.screen.height,
        );
        let pool = StripWindowPool::new("tabrail", config.settings.tabstrip.max_pooled);
        Rc::new(Desktop {
            config,
            server,
            ids: RefCell::new(SlotMap::with_key()),
            windows: RefCell::new(SecondaryMap::new()),
            identities: RefCell::new(HashMap::default()),
            groups: RefCell::new(HashMap::default()),
            next_group: Cell::new(1),
            screen: Cell::new(screen),
            store,
            pool,
            transactions: TxStore::new(),
            signals: GroupSignals::default(),
        })
    }

    pub fn config(&self) -> &Config { &self.config }

    pub fn server(&self) -> &ServerHandle { &self.server }

    pub fn screen(&self) -> Rect { self.screen.get() }

    pub fn set_screen(&self, screen: Rect) { self.screen.set(screen); }

    /// Registers an already-existing backend window with the model.
    pub fn register_window(
        &self,
        identity: WindowIdentity,
        state: WindowState,
    ) -> Rc<WindowEntity> {
        let id = self.ids.borrow_mut().insert(());
        let entity = WindowEntity::new(
            id,
            identity.clone(),
            self.server.clone(),
            state,
            SnapGroup::fresh(),
        );
        self.windows.borrow_mut().insert(id, entity.clone());
        self.identities.borrow_mut().insert(identity, id);
        entity
    }

    /// Asks the backend to create a window, then registers it.
    pub async fn create_window(&self, spec: WindowSpec) -> Result<Rc<WindowEntity>, ServerError> {
        let id = self.ids.borrow_mut().insert(());
        let state = match self.server.create(id, spec.clone()).await {
            Ok(state) => state,
            Err(err) => {
                self.ids.borrow_mut().remove(id);
                return Err(err);
            }
        };
        let entity = WindowEntity::new(
            id,
            spec.identity.clone(),
            self.server.clone(),
            state,
            SnapGroup::fresh(),
        );
        self.windows.borrow_mut().insert(id, entity.clone());
        self.identities.borrow_mut().insert(spec.identity, id);
        Ok(entity)
    }

    pub fn get_window(&self, identity: &WindowIdentity) -> Option<Rc<WindowEntity>> {
        let id = self.get_id(identity)?;
        self.window_by_id(id)
    }

    pub fn get_id(&self, identity: &WindowIdentity) -> Option<WindowId> {
        self.identities.borrow().get(identity).copied()
    }

    pub fn window_by_id(&self, id: WindowId) -> Option<Rc<WindowEntity>> {
        self.windows.borrow().get(id).cloned()
    }

    pub fn group_by_id(&self, id: TabGroupId) -> Option<Rc<TabGroup>> {
        self.groups.borrow().get(&id).cloned()
    }

    pub fn group_count(&self) -> usize { self.groups.borrow().len() }

    fn unregister_window(&self, id: WindowId) {
        let entity = self.windows.borrow_mut().remove(id);
        if let Some(entity) = entity {
            self.identities.borrow_mut().remove(entity.identity());
            entity.snap_group().remove(id);
        }
        self.ids.borrow_mut().remove(id);
        self.transactions.forget(id);
    }

    /// Produces an empty tab group around a pooled or freshly created strip
    /// window and announces it process-wide.
    pub async fn create_tab_group(self: &Rc<Self>) -> Result<Rc<TabGroup>, ServerError> {
        let settings = self.config.settings.tabstrip.clone();
        let strip = match self.pool.checkout(&settings) {
            Some(strip) => strip,
            None => {
                let spec = self.pool.creation_spec(&settings);
                self.create_window(spec).await?
            }
        };
        strip.set_snap_group(SnapGroup::fresh());

        let id = TabGroupId(self.next_group.get());
        self.next_group.set(id.0 + 1);
        let group = TabGroup::new(
            id,
            settings,
            strip,
            Rc::downgrade(self),
            self.store.clone(),
        );
        self.groups.borrow_mut().insert(id, group.clone());
        debug!(group = %id, "tab group created");
        self.signals.group_created.emit(&group);
        Ok(group)
    }

    /// Called by a disbanding group, exactly once per group.
    pub(crate) fn retire_group(&self, id: TabGroupId) {
        let group = self.groups.borrow_mut().remove(&id);
        if let Some(group) = group {
            debug!(group = %id, "tab group destroyed");
            self.signals.group_destroyed.emit(&group);
        }
    }

    /// Returns a disbanded group's strip to the pool, or closes it when the
    /// pool is full or the strip already died.
    pub(crate) async fn release_strip(&self, strip: &Rc<WindowEntity>) -> Result<(), ServerError> {
        if !strip.is_alive() {
            return Ok(());
        }
        strip
            .apply_properties(crate::window::PropertyDelta::default().hidden(true))
            .await?;
        if self.pool.release(strip.clone()) {
            return Ok(());
        }
        strip.close().await
    }

    /// Drains unsolicited backend events into the entities they concern.
    pub async fn run(self: Rc<Self>, mut events: actor::Receiver<ServerEvent>) {
        while let Some((span, event)) = events.recv().await {
            let _guard = span.enter();
            self.handle_event(event);
        }
        debug!("window server event stream ended");
    }

    #[instrument(name = "desktop::handle_event", skip(self))]
    pub fn handle_event(&self, event: ServerEvent) {
        match event {
            ServerEvent::Transformed { id, frame, mask } => {
                if let Some(entity) = self.window_by_id(id) {
                    entity.note_external_transform(frame, mask);
                }
            }
            ServerEvent::Committed { id } => {
                if let Some(entity) = self.window_by_id(id) {
                    entity.note_commit();
                }
            }
            ServerEvent::Modified { id, title, icon } => {
                if let Some(entity) = self.window_by_id(id) {
                    entity.note_external_modified(title, icon);
                }
            }
            ServerEvent::Closed { id } => {
                let Some(entity) = self.window_by_id(id) else {
                    warn!(?id, "close event for unknown window");
                    return;
                };
                entity.mark_torn_down();
                self.unregister_window(id);
            }
        }
    }
}
