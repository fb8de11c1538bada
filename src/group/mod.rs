//! Tab groups: a strip window stacked above one visible member at a time.
//!
//! A group owns its strip window outright and references an ordered list of
//! member windows it does not own. Every mutating operation here is a
//! choreography across independently owned, independently slow windows:
//! steps that depend on each other are sequenced, independent steps are
//! issued concurrently and awaited together. A fan-out fails as a group if
//! any leg fails; side effects already applied elsewhere are not rolled
//! back.
//!
//! Membership and movement-group membership stay in lockstep: the strip and
//! every member share one snap group for as long as they are grouped, and
//! an ejected member leaves on a fresh singleton group.

pub mod events;
pub mod properties;
pub mod strip_pool;

#[cfg(test)]
mod tests;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use futures::future::try_join_all;
use tracing::{debug, instrument, warn};

use crate::actor;
use crate::actor::broadcast::Subscription;
use crate::common::collections::{HashMap, HashSet};
use crate::common::config::TabstripSettings;
use crate::common::geometry::{Point, Rect};
use crate::group::events::TabEvent;
use crate::group::properties::{PropertyStore, TabProperties, TabPropertiesDelta};
use crate::model::snap_group::SnapGroup;
use crate::model::{Desktop, TabGroupId};
use crate::sys::window_server::ServerError;
use crate::window::{DisplayState, PropertyDelta, WindowEntity, WindowId, WindowIdentity};

#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("window {0:?} is not a member of this tab group")]
    NotAMember(WindowId),
    #[error("tab order must be a one-to-one match of current members")]
    InvalidOrder,
    #[error("tab group is already destroyed")]
    Destroyed,
    #[error("desktop model is gone")]
    ModelGone,
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// What happens to a removed member's bounds once it stands alone again.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BoundsPolicy {
    /// Grow the window back over the space the strip occupied.
    #[default]
    Restore,
    /// Leave bounds untouched; only unhide and restore the frame.
    Unchanged,
    /// Put the window exactly here.
    Override(Rect),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Active,
    Disbanding,
    Destroyed,
}

struct MemberObservers {
    teardown: Subscription,
    transform: Subscription,
}

pub struct TabGroup {
    id: TabGroupId,
    settings: TabstripSettings,
    strip: Rc<WindowEntity>,
    members: RefCell<Vec<Rc<WindowEntity>>>,
    active: RefCell<Option<WindowId>>,
    properties: RefCell<HashMap<WindowId, TabProperties>>,
    observers: RefCell<HashMap<WindowId, MemberObservers>>,
    maximized: Cell<bool>,
    pre_maximize_bounds: Cell<Option<Rect>>,
    lifecycle: Cell<Lifecycle>,
    desktop: Weak<Desktop>,
    store: Rc<dyn PropertyStore>,
}

impl TabGroup {
    pub(crate) fn new(
        id: TabGroupId,
        settings: TabstripSettings,
        strip: Rc<WindowEntity>,
        desktop: Weak<Desktop>,
        store: Rc<dyn PropertyStore>,
    ) -> Rc<Self> {
        strip.set_tab_group(Some(id));
        Rc::new(TabGroup {
            id,
            settings,
            strip,
            members: RefCell::new(Vec::new()),
            active: RefCell::new(None),
            properties: RefCell::new(HashMap::default()),
            observers: RefCell::new(HashMap::default()),
            maximized: Cell::new(false),
            pre_maximize_bounds: Cell::new(None),
            lifecycle: Cell::new(Lifecycle::Active),
            desktop,
            store,
        })
    }

    pub fn id(&self) -> TabGroupId { self.id }

    pub fn strip(&self) -> &Rc<WindowEntity> { &self.strip }

    pub fn members(&self) -> Vec<Rc<WindowEntity>> { self.members.borrow().clone() }

    pub fn member_count(&self) -> usize { self.members.borrow().len() }

    pub fn is_member(&self, id: WindowId) -> bool {
        self.members.borrow().iter().any(|m| m.id() == id)
    }

    pub fn is_maximized(&self) -> bool { self.maximized.get() }

    pub fn tab_properties(&self, id: WindowId) -> Option<TabProperties> {
        self.properties.borrow().get(&id).cloned()
    }

    /// The single unhidden member. Defaults to the first member when no
    /// activation has happened yet.
    pub fn active_tab(&self) -> Option<Rc<WindowEntity>> {
        let members = self.members.borrow();
        let id = *self.active.borrow();
        id.and_then(|id| members.iter().find(|m| m.id() == id).cloned())
            .or_else(|| members.first().cloned())
    }

    /// Combined bounds, recomputed from the strip and the active member on
    /// every read: same horizontal extent as the strip, stacked heights,
    /// the strip's top edge on top.
    pub fn bounds(&self) -> Option<Rect> {
        let active = self.active_tab()?;
        let strip = self.strip.frame();
        let height = strip.height() + active.frame().height();
        Some(Rect {
            center: Point::new(strip.center.x, strip.top() + height / 2.0),
            half_size: Point::new(strip.half_size.x, height / 2.0),
        })
    }

    fn desktop(&self) -> Result<Rc<Desktop>, GroupError> {
        self.desktop.upgrade().ok_or(GroupError::ModelGone)
    }

    fn member_by_id(&self, id: WindowId) -> Option<Rc<WindowEntity>> {
        self.members.borrow().iter().find(|m| m.id() == id).cloned()
    }

    fn index_of(&self, id: WindowId) -> Option<usize> {
        self.members.borrow().iter().position(|m| m.id() == id)
    }

    // ---- membership -------------------------------------------------------

    #[instrument(name = "tab_group::add_tab", skip_all, fields(group = %self.id, window = ?window.id()))]
    pub async fn add_tab(
        self: &Rc<Self>,
        window: &Rc<WindowEntity>,
    ) -> Result<(), GroupError> {
        let index = self.members.borrow().len();
        self.add_tab_internal(window, index, true).await
    }

    #[instrument(name = "tab_group::add_tab_at", skip_all, fields(group = %self.id, window = ?window.id(), index = index))]
    pub async fn add_tab_at(
        self: &Rc<Self>,
        window: &Rc<WindowEntity>,
        index: usize,
    ) -> Result<(), GroupError> {
        self.add_tab_internal(window, index, true).await
    }

    /// Batch insertion. Runs as one transaction spanning the strip and every
    /// window involved so nothing else interleaves with them mid-batch.
    #[instrument(name = "tab_group::add_tabs", skip_all, fields(group = %self.id, count = windows.len()))]
    pub async fn add_tabs(
        self: &Rc<Self>,
        windows: &[Rc<WindowEntity>],
        active: Option<WindowId>,
    ) -> Result<(), GroupError> {
        let desktop = self.desktop()?;
        let mut ids: Vec<WindowId> = windows.iter().map(|w| w.id()).collect();
        ids.push(self.strip.id());
        let _tx = desktop.transactions.acquire(&ids).await;

        for (position, window) in windows.iter().enumerate() {
            let index = self.members.borrow().len();
            self.add_tab_internal(window, index, position == 0).await?;
        }

        let first = windows.first();
        match active.and_then(|id| self.member_by_id(id)) {
            Some(target) if first.is_some_and(|f| f.id() != target.id()) => {
                self.switch_tab(&target).await?;
            }
            _ => {
                // no switch happened; resend so the strip UI still learns
                // which tab is active
                if let Some(first) = first {
                    self.send_activated(first).await?;
                }
            }
        }
        Ok(())
    }

    async fn add_tab_internal(
        self: &Rc<Self>,
        window: &Rc<WindowEntity>,
        index: usize,
        activate: bool,
    ) -> Result<(), GroupError> {
        if self.lifecycle.get() != Lifecycle::Active {
            return Err(GroupError::Destroyed);
        }
        if self.is_member(window.id()) {
            return Ok(());
        }
        if !window.is_ready() {
            return Err(ServerError::WindowGone(window.id()).into());
        }

        // cross-group move: pull the window out of its old group while the
        // initial cache sync runs
        let previous_group = window
            .tab_group()
            .filter(|id| *id != self.id)
            .and_then(|id| self.desktop().ok().and_then(|d| d.group_by_id(id)));
        if let Some(previous) = previous_group {
            tokio::try_join!(
                previous.remove_tab(window, BoundsPolicy::Restore),
                async { window.refresh().await.map_err(GroupError::from) },
            )?;
        } else {
            window.refresh().await?;
        }

        // (a) display properties: persisted if present, else derived live
        let display_properties = self
            .store
            .read(window.identity())
            .unwrap_or_else(|| TabProperties::derive(&window.current_state()));
        self.properties.borrow_mut().insert(window.id(), display_properties.clone());

        // (b) lifecycle observers
        self.register_observers(window);

        let active_before = self.active_tab();
        let index = index.min(self.members.borrow().len());
        self.members.borrow_mut().insert(index, window.clone());
        window.set_tab_group(Some(self.id));

        // (c) geometry: the first member donates the strip's anchor; later
        // members are forced onto the current active member's bounds
        match active_before {
            None => {
                let footprint = window.frame();
                let (band, rest) = footprint.split_top(self.settings.height);
                tokio::try_join!(
                    self.strip.apply_properties(PropertyDelta::bounds(band).hidden(false)),
                    window.apply_properties(
                        PropertyDelta::bounds(rest).frame_decorated(false)
                    ),
                )?;
            }
            Some(active) => {
                window
                    .apply_properties(
                        PropertyDelta::bounds(active.frame()).frame_decorated(false),
                    )
                    .await?;
            }
        }

        // (d) movement group joins the strip's
        window.set_snap_group(self.strip.snap_group());

        // (e) join notification to both sides
        self.notify_pair(
            window,
            TabEvent::JoinTabGroup {
                group_id: self.id,
                member_id: window.id(),
                display_properties,
                index,
            },
        )
        .await?;

        // (f) only the active member stays visible
        if !activate {
            window.apply_properties(PropertyDelta::default().hidden(true)).await?;
        }

        // (g)
        self.strip.bring_to_front().await?;

        // (h)
        if activate {
            self.make_active(window).await?;
        }
        debug!(group = %self.id, window = ?window.id(), index, "tab added");
        Ok(())
    }

    /// Replaces `remove` with `add` in place. Fails if `remove` is not a
    /// member. The outgoing window keeps its grouped bounds and stays
    /// hidden.
    #[instrument(name = "tab_group::swap_tab", skip_all, fields(group = %self.id))]
    pub async fn swap_tab(
        self: &Rc<Self>,
        remove: &Rc<WindowEntity>,
        add: &Rc<WindowEntity>,
    ) -> Result<(), GroupError> {
        let Some(index) = self.index_of(remove.id()) else {
            return Err(GroupError::NotAMember(remove.id()));
        };
        let was_active = self.active_tab().is_some_and(|a| a.id() == remove.id());

        self.add_tab_internal(add, index + 1, was_active).await?;
        self.remove_tab_internal(remove).await
    }

    /// Rebuilds the member order. The given identities must map one-to-one
    /// onto current members; anything unresolved, missing or duplicated
    /// rejects the whole call with membership unchanged.
    pub fn reorder_tabs(&self, order: &[WindowIdentity]) -> Result<(), GroupError> {
        let desktop = self.desktop()?;
        let mut reordered = Vec::with_capacity(order.len());
        {
            let members = self.members.borrow();
            if order.len() != members.len() {
                return Err(GroupError::InvalidOrder);
            }
            let mut seen: HashSet<WindowId> = HashSet::default();
            for identity in order {
                let id = desktop.get_id(identity).ok_or(GroupError::InvalidOrder)?;
                let member = members
                    .iter()
                    .find(|m| m.id() == id)
                    .ok_or(GroupError::InvalidOrder)?;
                if !seen.insert(id) {
                    return Err(GroupError::InvalidOrder);
                }
                reordered.push(member.clone());
            }
        }
        *self.members.borrow_mut() = reordered;
        Ok(())
    }

    /// Removes a member and restores it to standalone life per `bounds`.
    /// No-op when the window is not a member.
    #[instrument(name = "tab_group::remove_tab", skip_all, fields(group = %self.id, window = ?window.id()))]
    pub async fn remove_tab(
        self: &Rc<Self>,
        window: &Rc<WindowEntity>,
        bounds: BoundsPolicy,
    ) -> Result<(), GroupError> {
        if !self.is_member(window.id()) {
            return Ok(());
        }

        // snapshot what the reattach heuristic needs before anything moves
        let member_count = self.member_count();
        let survivor = if member_count == 2 {
            self.members.borrow().iter().find(|m| m.id() != window.id()).cloned()
        } else {
            None
        };
        let external_partner = self.external_snap_partner();
        let frame_before = window.frame();

        self.remove_tab_internal(window).await?;

        if window.is_alive() {
            let delta = match bounds {
                BoundsPolicy::Override(rect) => PropertyDelta::bounds(rect),
                BoundsPolicy::Unchanged => PropertyDelta::default(),
                BoundsPolicy::Restore => {
                    PropertyDelta::bounds(frame_before.grow_top(self.settings.height))
                }
            };
            window
                .apply_properties(delta.hidden(false).frame_decorated(true))
                .await?;
        }

        // Disband of a group that was snapped to something else: after a
        // deliberate pause, hand the survivor back to its old partner's
        // movement group. Pure race mitigation for the window manager's
        // leave notifications; skipped silently when anything is gone.
        if member_count == 2
            && let (Some(partner_id), Some(survivor)) = (external_partner, survivor)
            && survivor.is_alive()
        {
            tokio::time::sleep(self.settings.reattach_delay()).await;
            if let Ok(desktop) = self.desktop()
                && let Some(partner) = desktop.window_by_id(partner_id)
                && partner.is_alive()
            {
                debug!(group = %self.id, ?partner_id, "re-attaching disband survivor");
                survivor.set_snap_group(partner.snap_group());
            }
        }
        Ok(())
    }

    /// Removes every member. With `close_windows` the members are closed and
    /// their teardown drives the removals; otherwise each is removed with
    /// the default bounds policy.
    pub async fn remove_all_tabs(self: &Rc<Self>, close_windows: bool) -> Result<(), GroupError> {
        let members = self.members();
        if close_windows {
            try_join_all(members.iter().map(|m| m.close())).await?;
        } else {
            for member in &members {
                self.remove_tab(member, BoundsPolicy::Restore).await?;
            }
        }
        Ok(())
    }

    pub async fn close_all(self: &Rc<Self>) -> Result<(), GroupError> {
        self.remove_all_tabs(true).await
    }

    // ---- activation, maximize, minimize -----------------------------------

    /// Makes `window` the visible member. No-op when it already is, or when
    /// it is not a member at all.
    #[instrument(name = "tab_group::switch_tab", skip_all, fields(group = %self.id, window = ?window.id()))]
    pub async fn switch_tab(
        self: &Rc<Self>,
        window: &Rc<WindowEntity>,
    ) -> Result<(), GroupError> {
        if !self.is_member(window.id()) {
            return Ok(());
        }
        let previous = (*self.active.borrow()).and_then(|id| self.member_by_id(id));
        if previous.as_ref().is_some_and(|p| p.id() == window.id()) {
            return Ok(());
        }

        let bounds_differ =
            previous.as_ref().is_some_and(|p| !p.frame().same_as(&window.frame()));
        if bounds_differ && let Some(previous) = &previous {
            // raise the old face first so the incoming window can paint
            // behind it; raising it immediately flashes stale content
            previous.bring_to_front().await?;
            window.apply_properties(PropertyDelta::default().hidden(false)).await?;
            tokio::time::sleep(self.settings.render_settle()).await;
            window.bring_to_front().await?;
        } else {
            window.apply_properties(PropertyDelta::default().hidden(false)).await?;
            window.bring_to_front().await?;
        }
        *self.active.borrow_mut() = Some(window.id());

        if let Some(previous) = &previous
            && previous.tab_group() == Some(self.id)
        {
            previous.apply_properties(PropertyDelta::default().hidden(true)).await?;
        }

        // resynchronize cached geometry on both sides; non-fatal
        let (new_sync, prev_sync) = tokio::join!(window.sync(), async {
            match &previous {
                Some(previous) if previous.is_alive() => previous.sync().await,
                _ => Ok(()),
            }
        });
        if let Err(err) = new_sync {
            warn!(?err, "geometry resync of activated tab failed");
        }
        if let Err(err) = prev_sync {
            warn!(?err, "geometry resync of deactivated tab failed");
        }

        self.send_activated(window).await
    }

    async fn make_active(self: &Rc<Self>, window: &Rc<WindowEntity>) -> Result<(), GroupError> {
        let current = *self.active.borrow();
        match current {
            Some(id) if id == window.id() => Ok(()),
            Some(_) => self.switch_tab(window).await,
            None => {
                *self.active.borrow_mut() = Some(window.id());
                window.apply_properties(PropertyDelta::default().hidden(false)).await?;
                window.bring_to_front().await?;
                self.send_activated(window).await
            }
        }
    }

    pub async fn toggle_maximize(self: &Rc<Self>) -> Result<(), GroupError> {
        if self.maximized.get() {
            self.restore().await
        } else {
            self.maximize().await
        }
    }

    /// Fills the screen: strip across the top at its configured height, the
    /// active member in all remaining space below it.
    #[instrument(name = "tab_group::maximize", skip_all, fields(group = %self.id))]
    pub async fn maximize(self: &Rc<Self>) -> Result<(), GroupError> {
        if self.maximized.get() {
            return Ok(());
        }
        let Some(active) = self.active_tab() else {
            return Ok(());
        };
        self.pre_maximize_bounds.set(Some(active.frame()));

        let screen = self.desktop()?.screen();
        let (band, rest) = screen.split_top(self.settings.height);
        tokio::try_join!(
            self.strip.apply_properties(PropertyDelta::bounds(band)),
            active.apply_properties(PropertyDelta::bounds(rest)),
        )?;
        self.maximized.set(true);
        Ok(())
    }

    /// Undoes a maximize, or normalizes display states when members are
    /// minimized. No-op when neither applies.
    #[instrument(name = "tab_group::restore", skip_all, fields(group = %self.id))]
    pub async fn restore(self: &Rc<Self>) -> Result<(), GroupError> {
        let Some(active) = self.active_tab() else {
            return Ok(());
        };
        if self.maximized.get() {
            if active.current_state().display == DisplayState::Minimized {
                // un-minimize everything; the maximized split is still in
                // effect so the flag stays
                return self.normalize_display_states().await;
            }
            if let Some(cached) = self.pre_maximize_bounds.get() {
                tokio::try_join!(
                    self.strip.apply_properties(
                        PropertyDelta::bounds(cached.band_above(self.settings.height))
                    ),
                    active.apply_properties(PropertyDelta::bounds(cached)),
                )?;
            }
            self.maximized.set(false);
            self.pre_maximize_bounds.set(None);
            return Ok(());
        }
        if self.any_member_minimized() {
            return self.normalize_display_states().await;
        }
        Ok(())
    }

    /// Minimizes the strip and the active member only; minimizing hidden
    /// members is unreliable on real window managers.
    pub async fn minimize(self: &Rc<Self>) -> Result<(), GroupError> {
        let Some(active) = self.active_tab() else {
            return Ok(());
        };
        tokio::try_join!(
            self.strip
                .apply_properties(PropertyDelta::default().display(DisplayState::Minimized)),
            active.apply_properties(PropertyDelta::default().display(DisplayState::Minimized)),
        )?;
        Ok(())
    }

    fn any_member_minimized(&self) -> bool {
        self.members
            .borrow()
            .iter()
            .any(|m| m.current_state().display == DisplayState::Minimized)
    }

    async fn normalize_display_states(&self) -> Result<(), GroupError> {
        let mut targets = self.members();
        targets.push(self.strip.clone());
        try_join_all(targets.iter().map(|t| {
            t.apply_properties(PropertyDelta::default().display(DisplayState::Normal))
        }))
        .await?;
        Ok(())
    }

    // ---- properties --------------------------------------------------------

    /// Merges an explicit icon/title update, writes it through the store and
    /// notifies both sides.
    pub async fn update_tab_properties(
        self: &Rc<Self>,
        window: &Rc<WindowEntity>,
        delta: TabPropertiesDelta,
    ) -> Result<(), GroupError> {
        if !self.is_member(window.id()) {
            return Err(GroupError::NotAMember(window.id()));
        }
        let properties = {
            let mut map = self.properties.borrow_mut();
            let entry = map
                .entry(window.id())
                .or_insert_with(|| TabProperties::derive(&window.current_state()));
            entry.merge(&delta);
            entry.clone()
        };
        self.store.write(window.identity(), &properties);
        self.notify_pair(
            window,
            TabEvent::TabPropertiesUpdated {
                group_id: self.id,
                member_id: window.id(),
                properties,
            },
        )
        .await
    }

    // ---- internals ---------------------------------------------------------

    /// Strips a member out of the group: list, properties, observers, back
    /// references. Sends the leave notification and disbands when
    /// membership falls below two.
    async fn remove_tab_internal(
        self: &Rc<Self>,
        window: &Rc<WindowEntity>,
    ) -> Result<(), GroupError> {
        let Some(index) = self.index_of(window.id()) else {
            return Ok(());
        };
        let was_active = self.active_tab().is_some_and(|a| a.id() == window.id());

        self.members.borrow_mut().remove(index);
        self.properties.borrow_mut().remove(&window.id());
        self.unregister_observers(window);
        if was_active {
            *self.active.borrow_mut() = None;
        }

        window.set_tab_group(None);
        if window.is_alive() {
            // eject onto a fresh singleton movement group; a window mid
            // teardown gets its movement group cleaned up by teardown itself
            window.set_snap_group(SnapGroup::fresh());
        }

        let leave = TabEvent::LeaveTabGroup {
            group_id: self.id,
            member_id: window.id(),
        };
        if window.is_alive() {
            self.notify_pair(window, leave).await?;
        } else {
            self.strip.notify(leave).await?;
        }

        let remaining = self.member_count();
        if remaining < 2 {
            self.disband().await?;
        } else if was_active {
            let next = {
                let members = self.members.borrow();
                members.get(index).or_else(|| members.get(index.wrapping_sub(1))).cloned()
            };
            if let Some(next) = next {
                self.switch_tab(&next).await?;
            }
        }
        debug!(group = %self.id, window = ?window.id(), "tab removed");
        Ok(())
    }

    /// Runs exactly once per group: ejects any remaining member while the
    /// strip is handed back, then announces destruction.
    async fn disband(self: &Rc<Self>) -> Result<(), GroupError> {
        if self.lifecycle.get() != Lifecycle::Active {
            return Ok(());
        }
        self.lifecycle.set(Lifecycle::Disbanding);
        debug!(group = %self.id, "disbanding");

        let desktop = self.desktop()?;
        let remaining = self.members();
        let (strip_result, eject_result) = tokio::join!(
            desktop.release_strip(&self.strip),
            async {
                for member in &remaining {
                    Box::pin(self.remove_tab(member, BoundsPolicy::Restore)).await?;
                }
                Ok::<_, GroupError>(())
            }
        );

        self.strip.set_tab_group(None);
        self.strip.set_snap_group(SnapGroup::fresh());
        self.lifecycle.set(Lifecycle::Destroyed);
        desktop.retire_group(self.id);

        strip_result?;
        eject_result
    }

    fn register_observers(self: &Rc<Self>, window: &Rc<WindowEntity>) {
        let id = window.id();

        let group = Rc::downgrade(self);
        let target = Rc::downgrade(window);
        let teardown = window.on_teardown.subscribe(move |_| {
            let (Some(group), Some(window)) = (group.upgrade(), target.upgrade()) else {
                return;
            };
            actor::spawn(async move {
                if let Err(err) = group.remove_tab(&window, BoundsPolicy::Restore).await {
                    warn!(?err, window = ?window.id(), "removing torn-down tab failed");
                }
            });
        });

        let group = Rc::downgrade(self);
        let transform = window.on_transform.subscribe(move |_mask| {
            if let Some(group) = group.upgrade() {
                group.note_member_transform(id);
            }
        });

        self.observers.borrow_mut().insert(id, MemberObservers { teardown, transform });
    }

    fn unregister_observers(&self, window: &Rc<WindowEntity>) {
        if let Some(observers) = self.observers.borrow_mut().remove(&window.id()) {
            window.on_teardown.unsubscribe(observers.teardown);
            window.on_transform.unsubscribe(observers.transform);
        }
    }

    /// A user just moved the active member: any cached maximize split is
    /// stale now.
    fn note_member_transform(&self, id: WindowId) {
        if self.maximized.get() && self.active_tab().is_some_and(|a| a.id() == id) {
            self.maximized.set(false);
            self.pre_maximize_bounds.set(None);
        }
    }

    /// First window in the strip's movement group that is neither the strip
    /// nor a member: the thing this whole group is snapped to.
    fn external_snap_partner(&self) -> Option<WindowId> {
        let mut ours: HashSet<WindowId> =
            self.members.borrow().iter().map(|m| m.id()).collect();
        ours.insert(self.strip.id());
        self.strip.snap_group().windows().into_iter().find(|id| !ours.contains(id))
    }

    async fn send_activated(
        self: &Rc<Self>,
        window: &Rc<WindowEntity>,
    ) -> Result<(), GroupError> {
        self.notify_pair(
            window,
            TabEvent::TabActivated {
                group_id: self.id,
                member_id: window.id(),
            },
        )
        .await
    }

    async fn notify_pair(
        &self,
        window: &Rc<WindowEntity>,
        event: TabEvent,
    ) -> Result<(), GroupError> {
        tokio::try_join!(window.notify(event.clone()), self.strip.notify(event))?;
        Ok(())
    }
}
