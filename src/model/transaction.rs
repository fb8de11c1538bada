//! Per-window transaction locks.
//!
//! Batch choreography over a set of windows must not interleave with other
//! mutations touching the same windows. The store keeps one async lock per
//! window id; a transaction acquires every id it declares, in sorted id
//! order so two overlapping acquisitions cannot deadlock, and releases them
//! all when dropped.

use std::sync::Arc;

use dashmap::DashMap;
use slotmap::Key;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::window::WindowId;

#[derive(Clone, Default)]
pub struct TxStore(Arc<DashMap<WindowId, Arc<Mutex<()>>>>);

impl TxStore {
    pub fn new() -> Self { Self::default() }

    fn slot(&self, id: WindowId) -> Arc<Mutex<()>> {
        self.0.entry(id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Suspends until every listed window is free, then holds them all.
    pub async fn acquire(&self, ids: &[WindowId]) -> Transaction {
        let mut ids: Vec<WindowId> = ids.to_vec();
        ids.sort_by_key(|id| id.data().as_ffi());
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            guards.push(self.slot(id).lock_owned().await);
        }
        Transaction { _guards: guards }
    }

    /// Drops the lock slot for a window that no longer exists.
    pub fn forget(&self, id: WindowId) { self.0.remove(&id); }
}

pub struct Transaction {
    _guards: Vec<OwnedMutexGuard<()>>,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use slotmap::KeyData;

    use super::*;

    fn wid(n: u64) -> WindowId { WindowId::from(KeyData::from_ffi(n << 32 | 1)) }

    #[tokio::test(start_paused = true)]
    async fn overlapping_transactions_exclude_each_other() {
        let store = TxStore::new();
        let tx = store.acquire(&[wid(1), wid(2)]).await;

        let blocked = tokio::time::timeout(
            Duration::from_millis(50),
            store.acquire(&[wid(2), wid(3)]),
        )
        .await;
        assert!(blocked.is_err(), "overlapping acquire should wait");

        drop(tx);
        let _tx2 = tokio::time::timeout(
            Duration::from_millis(50),
            store.acquire(&[wid(2), wid(3)]),
        )
        .await
        .expect("freed ids should be acquirable");
    }

    #[tokio::test]
    async fn disjoint_transactions_do_not_block() {
        let store = TxStore::new();
        let _a = store.acquire(&[wid(1)]).await;
        let _b = store.acquire(&[wid(2)]).await;
    }

    #[tokio::test]
    async fn duplicate_ids_collapse() {
        let store = TxStore::new();
        let _tx = store.acquire(&[wid(1), wid(1)]).await;
    }
}
