//! Process-wide group lifecycle signals.
//!
//! Multi-subscriber, synchronous fan-out: subscribers run on the emitting
//! call stack, in subscription order. Handlers may subscribe or unsubscribe
//! from inside a fan-out; emission walks a snapshot of the list taken when
//! it starts.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::group::TabGroup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

pub struct Signal<T> {
    subscribers: RefCell<Vec<(u64, Rc<dyn Fn(&T)>)>>,
    next_id: Cell<u64>,
}

impl<T> Default for Signal<T> {
    fn default() -> Self { Signal::new() }
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Signal {
            subscribers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    pub fn subscribe(&self, handler: impl Fn(&T) + 'static) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.subscribers.borrow_mut().push((id, Rc::new(handler)));
        Subscription(id)
    }

    pub fn unsubscribe(&self, subscription: Subscription) {
        self.subscribers.borrow_mut().retain(|(id, _)| *id != subscription.0);
    }

    pub fn emit(&self, payload: &T) {
        let snapshot: Vec<Rc<dyn Fn(&T)>> =
            self.subscribers.borrow().iter().map(|(_, h)| h.clone()).collect();
        for handler in snapshot {
            handler(payload);
        }
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize { self.subscribers.borrow().len() }
}

/// The two process-wide signals the grouping engine emits.
#[derive(Default)]
pub struct GroupSignals {
    pub group_created: Signal<Rc<TabGroup>>,
    pub group_destroyed: Signal<Rc<TabGroup>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_out_runs_in_subscription_order() {
        let signal: Signal<u32> = Signal::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let a = seen.clone();
        signal.subscribe(move |v| a.borrow_mut().push(("a", *v)));
        let b = seen.clone();
        signal.subscribe(move |v| b.borrow_mut().push(("b", *v)));

        signal.emit(&7);
        assert_eq!(*seen.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let signal: Signal<u32> = Signal::new();
        let seen = Rc::new(Cell::new(0u32));

        let s = seen.clone();
        let sub = signal.subscribe(move |v| s.set(s.get() + *v));
        signal.emit(&1);
        signal.unsubscribe(sub);
        signal.emit(&1);

        assert_eq!(seen.get(), 1);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn handlers_may_unsubscribe_mid_emit() {
        let signal: Rc<Signal<()>> = Rc::new(Signal::new());
        let fired = Rc::new(Cell::new(0u32));

        let sig = signal.clone();
        let f = fired.clone();
        let sub = Rc::new(Cell::new(None));
        let sub2 = sub.clone();
        let id = signal.subscribe(move |_| {
            f.set(f.get() + 1);
            if let Some(id) = sub2.take() {
                sig.unsubscribe(id);
            }
        });
        sub.set(Some(id));

        signal.emit(&());
        signal.emit(&());
        assert_eq!(fired.get(), 1);
    }
}
