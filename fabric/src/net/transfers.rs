// Copyright © 2022 The Radicle Link Contributors
//
// This file is part of radicle-link, distributed under the GPLv3 with Radicle
// Linking Exception. For full terms see the included LICENSE file.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

use crate::object_id::ObjectId;

/// Cap on concurrently running outbound transfers of the same object.
///
/// Two simultaneous sends of one blob halve each stream's throughput without
/// benefit, so a holder serialises per object and lets other requesters poll.
const MAX_PER_OBJECT: usize = 1;

/// Book-keeping of currently running outbound transfers, keyed by object.
///
/// Entries are created lazily on first request and never reaped. The count
/// for an id is restored when its [`Permit`] goes out of scope, whichever way
/// the transfer ends.
#[derive(Clone, Default)]
pub struct Transfers {
    running: Arc<Mutex<HashMap<ObjectId, usize>>>,
}

impl Transfers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to reserve the outbound slot for `object`.
    ///
    /// `None` means a transfer of this object is already in flight.
    pub fn try_begin(&self, object: ObjectId) -> Option<Permit> {
        let mut running = self.running.lock();
        let slot = running.entry(object).or_insert(0);
        if *slot < MAX_PER_OBJECT {
            *slot += 1;
            Some(Permit {
                object,
                running: Arc::clone(&self.running),
            })
        } else {
            None
        }
    }

    /// Number of distinct objects ever requested from this node.
    pub fn known(&self) -> usize {
        self.running.lock().len()
    }
}

/// Exclusive permission to run one outbound transfer of an object.
#[must_use = "dropping the permit releases the transfer slot"]
pub struct Permit {
    object: ObjectId,
    running: Arc<Mutex<HashMap<ObjectId, usize>>>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        let mut running = self.running.lock();
        let slot = running
            .get_mut(&self.object)
            .expect("a live permit implies a counter entry");
        debug_assert!(*slot > 0, "outbound transfer counter underflow");
        *slot -= 1;
    }
}
