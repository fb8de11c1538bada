//! Movement-group bookkeeping.
//!
//! A snap group is the set of windows that move and resize together. The
//! snapping engine that decides adjacency lives outside this crate; here a
//! group is only a membership list, kept in lockstep with tab membership by
//! the grouping engine. Members are listed by id and resolved through the
//! desktop model, so groups never own their windows.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::window::WindowId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapGroupId(u64);

thread_local! {
    static NEXT_ID: Cell<u64> = const { Cell::new(1) };
}

#[derive(Debug)]
pub struct SnapGroup {
    id: SnapGroupId,
    windows: RefCell<Vec<WindowId>>,
}

impl SnapGroup {
    /// A fresh, empty group. Always constructible.
    pub fn fresh() -> Rc<Self> {
        let id = NEXT_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            id
        });
        Rc::new(SnapGroup {
            id: SnapGroupId(id),
            windows: RefCell::new(Vec::new()),
        })
    }

    pub fn id(&self) -> SnapGroupId { self.id }

    pub fn windows(&self) -> Vec<WindowId> { self.windows.borrow().clone() }

    pub fn len(&self) -> usize { self.windows.borrow().len() }

    pub fn is_empty(&self) -> bool { self.windows.borrow().is_empty() }

    pub fn contains(&self, id: WindowId) -> bool { self.windows.borrow().contains(&id) }

    pub(crate) fn insert(&self, id: WindowId) {
        let mut windows = self.windows.borrow_mut();
        if !windows.contains(&id) {
            windows.push(id);
        }
    }

    pub(crate) fn remove(&self, id: WindowId) {
        self.windows.borrow_mut().retain(|w| *w != id);
    }
}

#[cfg(test)]
mod tests {
    use slotmap::KeyData;

    use super::*;

    fn wid(n: u64) -> WindowId { WindowId::from(KeyData::from_ffi(n << 32 | 1)) }

    #[test]
    fn fresh_groups_are_empty_and_distinct() {
        let a = SnapGroup::fresh();
        let b = SnapGroup::fresh();
        assert!(a.is_empty());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn insert_is_idempotent() {
        let group = SnapGroup::fresh();
        group.insert(wid(1));
        group.insert(wid(1));
        group.insert(wid(2));
        assert_eq!(group.len(), 2);
        group.remove(wid(1));
        assert_eq!(group.windows(), vec![wid(2)]);
    }
}
