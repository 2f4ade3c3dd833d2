//! Observable state containers.
//!
//! A [`Store`] is a shared handle over a value. Every mutation notifies the
//! subscribers synchronously, in subscription order, with the new value.
//! [`Derived`] values hang off a store and are recomputed on each change.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Inner<T> {
    value: T,
    next_id: u64,
    subscribers: Vec<(u64, Callback<T>)>,
}

/// Shared, observable value.
///
/// Notifications are serialised: an update from another thread waits until
/// every subscriber has seen the previous value. Subscribers may read the
/// store but must not mutate it.
pub struct Store<T> {
    inner: Arc<Mutex<Inner<T>>>,
    notify: Arc<Mutex<()>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            notify: self.notify.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> Store<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                value,
                next_id: 0,
                subscribers: Vec::new(),
            })),
            notify: Arc::new(Mutex::new(())),
        }
    }

    /// Returns a snapshot of the current value.
    pub fn get(&self) -> T {
        self.lock().value.clone()
    }

    /// Reads the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.lock().value)
    }

    /// Replaces the value and notifies subscribers.
    pub fn set(&self, value: T) {
        self.update(|current| *current = value);
    }

    /// Mutates the value in place and notifies subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let _notifying = self.lock_notify();
        let (value, subscribers) = {
            let mut inner = self.lock();
            f(&mut inner.value);
            let subscribers: Vec<_> = inner
                .subscribers
                .iter()
                .map(|(_, callback)| callback.clone())
                .collect();
            (inner.value.clone(), subscribers)
        };

        for callback in subscribers {
            callback(&value);
        }
    }

    /// Registers `f`, calls it once with the current value, and keeps it
    /// registered until the returned [`Subscription`] is dropped.
    pub fn subscribe(&self, f: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let callback: Callback<T> = Arc::new(f);
        let notifying = self.lock_notify();
        let (id, value) = {
            let mut inner = self.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.push((id, callback.clone()));
            (id, inner.value.clone())
        };
        callback(&value);
        drop(notifying);

        let weak: Weak<Mutex<Inner<T>>> = Arc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
                    inner.subscribers.retain(|(existing, _)| *existing != id);
                }
            })),
        }
    }

    /// Builds a value recomputed from this store on every change.
    pub fn derive<U>(&self, f: impl Fn(&T) -> U + Send + Sync + 'static) -> Derived<U>
    where
        U: Clone + Send + 'static,
    {
        let initial = self.with(|value| f(value));
        let slot = Arc::new(Mutex::new(initial));
        let target = slot.clone();
        let subscription = self.subscribe(move |value| {
            let next = f(value);
            *target.lock().unwrap_or_else(PoisonError::into_inner) = next;
        });

        Derived {
            value: slot,
            _subscription: Arc::new(subscription),
        }
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock_notify(&self) -> MutexGuard<'_, ()> {
        self.notify.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Store")
            .field("value", &inner.value)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

/// Handle returned by [`Store::subscribe`]. Dropping it unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish()
    }
}

/// Value kept in sync with a [`Store`].
#[derive(Clone)]
pub struct Derived<U> {
    value: Arc<Mutex<U>>,
    _subscription: Arc<Subscription>,
}

impl<U: Clone> Derived<U> {
    pub fn get(&self) -> U {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<U: fmt::Debug> fmt::Debug for Derived<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_tuple("Derived").field(&*value).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::mpsc, thread, time::Duration};

    use super::*;

    #[test]
    fn notifies_subscribers_in_order() {
        let store = Store::new(1_u32);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = seen.clone();
        let _a = store.subscribe(move |v| first.lock().unwrap().push(("a", *v)));
        let second = seen.clone();
        let _b = store.subscribe(move |v| second.lock().unwrap().push(("b", *v)));

        store.set(2);

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen, vec![("a", 1), ("b", 1), ("a", 2), ("b", 2)]);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let store = Store::new(0_u32);
        let hits = Arc::new(Mutex::new(0));
        let counter = hits.clone();
        let subscription = store.subscribe(move |_| *counter.lock().unwrap() += 1);
        assert_eq!(store.subscriber_count(), 1);

        drop(subscription);
        store.set(5);

        assert_eq!(store.subscriber_count(), 0);
        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn derived_values_follow_the_store() {
        let store = Store::new(vec![1, 2, 3]);
        let total = store.derive(|items: &Vec<i32>| items.iter().sum::<i32>());
        assert_eq!(total.get(), 6);

        store.update(|items| items.push(4));
        assert_eq!(total.get(), 10);
    }

    #[test]
    fn subscribers_may_read_the_store() {
        let store = Store::new(String::from("a"));
        let reader = store.clone();
        let seen = Arc::new(Mutex::new(String::new()));
        let sink = seen.clone();
        let _sub = store.subscribe(move |_| *sink.lock().unwrap() = reader.get());

        store.set("b".to_string());
        assert_eq!(*seen.lock().unwrap(), "b");
    }

    #[test]
    fn concurrent_updates_reach_derived_values_in_order() {
        let store = Store::new(0_u32);
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let entered_tx = Mutex::new(entered_tx);
        let release_rx = Mutex::new(release_rx);

        // Registered before the derived value so it runs first and stalls
        // the notification of `1`.
        let _gate = store.subscribe(move |v| {
            if *v == 1 {
                entered_tx.lock().unwrap().send(()).unwrap();
                release_rx.lock().unwrap().recv().unwrap();
            }
        });
        let latest = store.derive(|v: &u32| *v);

        let first = {
            let store = store.clone();
            thread::spawn(move || store.set(1))
        };
        entered_rx.recv().unwrap();

        let second = {
            let store = store.clone();
            thread::spawn(move || store.set(2))
        };
        thread::sleep(Duration::from_millis(20));
        release_tx.send(()).unwrap();

        first.join().unwrap();
        second.join().unwrap();
        assert_eq!(store.get(), 2);
        assert_eq!(latest.get(), 2);
    }
}
