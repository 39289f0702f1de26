/// Single-threaded observer registry with explicit cancellation handles
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback = Rc<dyn Fn()>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    observers: Vec<(u64, Callback)>,
}

/// A notification source (frame tick, camera move, resize).
///
/// Observers are called in registration order. An observer may cancel
/// subscriptions, including its own, while a notification is in flight; the
/// cancelled callbacks are skipped for the rest of that notification.
#[derive(Clone, Default)]
pub struct Observable {
    registry: Rc<RefCell<Registry>>,
}

impl Observable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. It stays registered until the returned
    /// subscription is cancelled; dropping the handle does not remove it.
    pub fn add(&self, callback: impl Fn() + 'static) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.observers.push((id, Rc::new(callback)));

        Subscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Call every registered observer.
    pub fn notify(&self) {
        // Snapshot so callbacks can add or cancel observers re-entrantly
        let snapshot: Vec<(u64, Callback)> = self.registry.borrow().observers.clone();

        for (id, callback) in snapshot {
            let still_registered = self
                .registry
                .borrow()
                .observers
                .iter()
                .any(|(other, _)| *other == id);
            if still_registered {
                callback();
            }
        }
    }

    pub fn observer_count(&self) -> usize {
        self.registry.borrow().observers.len()
    }
}

impl fmt::Debug for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("observers", &self.observer_count())
            .finish()
    }
}

/// Handle returned by [`Observable::add`].
#[must_use = "a subscription that is never cancelled keeps its callback alive"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl Subscription {
    /// Remove the callback from its observable.
    ///
    /// Returns `false` if the callback was already gone or the observable
    /// has been dropped.
    pub fn cancel(self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut registry = registry.borrow_mut();
        let before = registry.observers.len();
        registry.observers.retain(|(id, _)| *id != self.id);
        registry.observers.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_notify_calls_observers() {
        let observable = Observable::new();
        let hits = Rc::new(Cell::new(0));

        let h = hits.clone();
        let _sub = observable.add(move || h.set(h.get() + 1));

        observable.notify();
        observable.notify();
        assert_eq!(hits.get(), 2);
        assert_eq!(observable.observer_count(), 1);
    }

    #[test]
    fn test_cancel_removes_observer() {
        let observable = Observable::new();
        let hits = Rc::new(Cell::new(0));

        let h = hits.clone();
        let sub = observable.add(move || h.set(h.get() + 1));
        assert!(sub.cancel());

        observable.notify();
        assert_eq!(hits.get(), 0);
        assert_eq!(observable.observer_count(), 0);
    }

    #[test]
    fn test_cancel_after_observable_dropped() {
        let observable = Observable::new();
        let sub = observable.add(|| {});
        drop(observable);
        assert!(!sub.cancel());
    }

    #[test]
    fn test_cancel_during_notify_skips_later_observer() {
        let observable = Observable::new();
        let hits = Rc::new(Cell::new(0));
        let pending: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let p = pending.clone();
        let _first = observable.add(move || {
            if let Some(sub) = p.borrow_mut().take() {
                sub.cancel();
            }
        });
        let h = hits.clone();
        *pending.borrow_mut() = Some(observable.add(move || h.set(h.get() + 1)));

        observable.notify();
        assert_eq!(hits.get(), 0);
        assert_eq!(observable.observer_count(), 1);
    }
}
