//! Pooled strip windows.
//!
//! Disbanded groups hand their strip back here instead of paying window
//! creation again for the next group. The pool is a slot table of released
//! strips plus a fallback that synthesizes creation parameters when the
//! table is empty.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};

use crate::common::config::TabstripSettings;
use crate::common::geometry::Rect;
use crate::sys::window_server::WindowSpec;
use crate::window::{WindowEntity, WindowIdentity};

new_key_type! {
    struct StripSlot;
}

pub struct StripWindowPool {
    owner: String,
    slots: RefCell<SlotMap<StripSlot, Rc<WindowEntity>>>,
    max_pooled: usize,
    next_serial: Cell<u64>,
}

impl StripWindowPool {
    pub fn new(owner: impl Into<String>, max_pooled: usize) -> Self {
        StripWindowPool {
            owner: owner.into(),
            slots: RefCell::new(SlotMap::with_key()),
            max_pooled,
            next_serial: Cell::new(0),
        }
    }

    /// A previously released strip matching `settings`, if any. Strips that
    /// died while pooled are discarded on the way.
    pub fn checkout(&self, settings: &TabstripSettings) -> Option<Rc<WindowEntity>> {
        let mut slots = self.slots.borrow_mut();
        slots.retain(|_, s| s.is_alive());
        let key = slots
            .iter()
            .find(|(_, s)| (s.frame().height() - settings.height).abs() < 0.5)
            .map(|(key, _)| key)?;
        slots.remove(key)
    }

    /// Returns `false` when the pool is full; the caller should close the
    /// strip instead.
    pub fn release(&self, strip: Rc<WindowEntity>) -> bool {
        let mut slots = self.slots.borrow_mut();
        slots.retain(|_, s| s.is_alive());
        if slots.len() >= self.max_pooled {
            return false;
        }
        slots.insert(strip);
        true
    }

    /// Creation parameters for a brand new strip window.
    pub fn creation_spec(&self, settings: &TabstripSettings) -> WindowSpec {
        let serial = self.next_serial.get();
        self.next_serial.set(serial + 1);
        WindowSpec {
            identity: WindowIdentity::new(self.owner.clone(), format!("tabstrip-{serial}")),
            frame: Rect::from_extent(0.0, 0.0, 400.0, settings.height),
            frame_decorated: false,
            hidden: true,
            title: String::new(),
        }
    }

    #[cfg(test)]
    pub fn pooled(&self) -> usize { self.slots.borrow().len() }
}
