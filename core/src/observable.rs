//! Observable value with a synchronous getter.
//!
//! `Observable` holds one value and fans every change out to its subscribers.
//! A new subscriber immediately receives the current value, then every later
//! change. Updates are delivered strictly in the order they are applied: an
//! update issued from inside a subscriber callback is queued and delivered
//! once the current fan-out has finished, so no two subscribers ever observe
//! changes in a different relative order.

use crate::runtime::{MaybeSendSync, lock};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};

#[cfg(target_arch = "wasm32")]
type Callback<T> = Arc<dyn Fn(&T)>;

#[cfg(not(target_arch = "wasm32"))]
type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

pub struct Observable<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    state: Mutex<State<T>>,
}

struct State<T> {
    value: T,
    next_id: u64,
    subscribers: Vec<(u64, Callback<T>)>,
    pending: VecDeque<Delivery<T>>,
    notifying: bool,
}

/// A value waiting to be delivered, with the subscribers it is addressed to.
struct Delivery<T> {
    value: T,
    recipients: Vec<u64>,
}

impl<T: Clone + MaybeSendSync + 'static> Observable<T> {
    pub fn new(initial: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    value: initial,
                    next_id: 0,
                    subscribers: Vec::new(),
                    pending: VecDeque::new(),
                    notifying: false,
                }),
            }),
        }
    }

    /// Current value, without subscribing.
    pub fn get(&self) -> T {
        lock(&self.shared.state).value.clone()
    }

    /// Read the current value in place.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&lock(&self.shared.state).value)
    }

    pub fn set(&self, value: T) {
        self.update(move |current| *current = value);
    }

    /// Mutate the value and publish the result to every subscriber.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.update_if(move |value| {
            f(value);
            true
        });
    }

    /// Mutate the value, publishing only if `f` returns `true`.
    ///
    /// The check and the mutation happen under one lock, so `f` can implement
    /// compare-and-set transitions. Returns whether a change was published.
    pub fn update_if(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        {
            let mut state = lock(&self.shared.state);
            if !f(&mut state.value) {
                return false;
            }
            let delivery = Delivery {
                value: state.value.clone(),
                recipients: state.subscribers.iter().map(|(id, _)| *id).collect(),
            };
            state.pending.push_back(delivery);
            if state.notifying {
                return true;
            }
            state.notifying = true;
        }
        self.shared.drain();
        true
    }

    /// Register `callback`. It is called with the current value right away
    /// (or after an in-progress fan-out completes) and then on every change.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + MaybeSendSync + 'static,
    {
        let id = {
            let mut state = lock(&self.shared.state);
            let id = state.next_id;
            state.next_id += 1;
            state.subscribers.push((id, Arc::new(callback)));
            let delivery = Delivery {
                value: state.value.clone(),
                recipients: vec![id],
            };
            state.pending.push_back(delivery);
            if state.notifying {
                drop(state);
                return self.subscription(id);
            }
            state.notifying = true;
            id
        };
        self.shared.drain();
        self.subscription(id)
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.shared.state).subscribers.len()
    }

    fn subscription(&self, id: u64) -> Subscription {
        let shared: Arc<dyn Unsubscribe> = self.shared.clone();
        Subscription {
            source: Some(Arc::downgrade(&shared)),
            id,
        }
    }
}

impl<T> Shared<T> {
    /// Deliver queued values until the queue is empty.
    fn drain(&self) {
        loop {
            let (value, callbacks) = {
                let mut state = lock(&self.state);
                let Some(delivery) = state.pending.pop_front() else {
                    state.notifying = false;
                    return;
                };
                let callbacks: Vec<Callback<T>> = delivery
                    .recipients
                    .iter()
                    .filter_map(|id| {
                        state
                            .subscribers
                            .iter()
                            .find(|(sub_id, _)| sub_id == id)
                            .map(|(_, callback)| callback.clone())
                    })
                    .collect();
                (delivery.value, callbacks)
            };

            for callback in callbacks {
                callback(&value);
            }
        }
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.shared.state);
        f.debug_struct("Observable")
            .field("value", &state.value)
            .field("subscribers", &state.subscribers.len())
            .finish()
    }
}

trait Unsubscribe: MaybeSendSync {
    fn remove(&self, id: u64) -> bool;
    fn contains(&self, id: u64) -> bool;
}

impl<T: MaybeSendSync> Unsubscribe for Shared<T> {
    fn remove(&self, id: u64) -> bool {
        let mut state = lock(&self.state);
        let before = state.subscribers.len();
        state.subscribers.retain(|(sub_id, _)| *sub_id != id);
        state.subscribers.len() != before
    }

    fn contains(&self, id: u64) -> bool {
        lock(&self.state)
            .subscribers
            .iter()
            .any(|(sub_id, _)| *sub_id == id)
    }
}

/// Handle to a registered subscriber. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    source: Option<Weak<dyn Unsubscribe>>,
    id: u64,
}

impl Subscription {
    /// Stop receiving values.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Whether the callback is still registered.
    pub fn is_active(&self) -> bool {
        self.source
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some_and(|source| source.contains(self.id))
    }

    fn release(&mut self) {
        if let Some(source) = self.source.take().and_then(|weak| weak.upgrade()) {
            source.remove(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
