// Copyright © 2022 The Radicle Link Contributors
//
// This file is part of radicle-link, distributed under the GPLv3 with Radicle
// Linking Exception. For full terms see the included LICENSE file.

use std::{collections::HashSet, sync::Arc, time::Duration};

use parking_lot::{Condvar, Mutex};

use crate::object_id::ObjectId;

/// All live subscriptions of one node.
///
/// Every notification arriving at the node is dispatched to every live
/// subscription; each subscription filters by its own pending set.
#[derive(Clone, Default)]
pub struct Subscriptions {
    subs: Arc<Mutex<Vec<Arc<Watch>>>>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription waiting for `pending`.
    ///
    /// This is the node-local half only; announcing the interest to the
    /// directory is the caller's business.
    pub fn insert<I>(&self, pending: I) -> Subscription
    where
        I: IntoIterator<Item = ObjectId>,
    {
        let watch = Arc::new(Watch {
            state: Mutex::new(State {
                pending: pending.into_iter().collect(),
                ready: HashSet::new(),
            }),
            wake: Condvar::new(),
        });
        self.subs.lock().push(Arc::clone(&watch));

        Subscription { watch }
    }

    /// Detach `sub`; it will see no further notifications.
    pub fn remove(&self, sub: &Subscription) {
        self.subs.lock().retain(|w| !Arc::ptr_eq(w, &sub.watch))
    }

    /// Deliver a completion notification to all live subscriptions.
    pub fn dispatch(&self, object: ObjectId) {
        for watch in self.subs.lock().iter() {
            watch.notify(object)
        }
    }
}

struct State {
    pending: HashSet<ObjectId>,
    ready: HashSet<ObjectId>,
}

struct Watch {
    state: Mutex<State>,
    wake: Condvar,
}

impl Watch {
    fn notify(&self, object: ObjectId) {
        let mut state = self.state.lock();
        // an id we were never waiting for is dropped silently
        if !state.pending.remove(&object) {
            return;
        }
        state.ready.insert(object);
        drop(state);

        self.wake.notify_one();
    }
}

/// Interest in the completion of a set of objects.
///
/// Single consumer: the behaviour of concurrent [`Subscription::wait`] calls
/// on one subscription is unspecified.
pub struct Subscription {
    watch: Arc<Watch>,
}

impl Subscription {
    /// Block until at least one subscribed object has completed, then return
    /// and clear the entire ready set.
    pub fn wait(&self) -> Vec<ObjectId> {
        let mut state = self.watch.state.lock();
        while state.ready.is_empty() {
            self.watch.wake.wait(&mut state);
        }

        state.ready.drain().collect()
    }

    /// Like [`Subscription::wait`], but give up after `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Vec<ObjectId>> {
        let mut state = self.watch.state.lock();
        if state.ready.is_empty() {
            let _ = self.watch.wake.wait_for(&mut state, timeout);
        }

        if state.ready.is_empty() {
            None
        } else {
            Some(state.ready.drain().collect())
        }
    }

    /// The ids still awaiting their completion notification.
    pub fn pending(&self) -> Vec<ObjectId> {
        self.watch.state.lock().pending.iter().copied().collect()
    }

    pub(super) fn notify(&self, object: ObjectId) {
        self.watch.notify(object)
    }
}
