// Copyright © 2022 The Radicle Link Contributors
//
// This file is part of radicle-link, distributed under the GPLv3 with Radicle
// Linking Exception. For full terms see the included LICENSE file.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::{Condvar, Mutex};

use super::{Blob, BlobMut, Error, Store};
use crate::object_id::ObjectId;

/// An in-memory [`Store`].
///
/// Clones share the same object table. `get` blocks on a condition that is
/// signalled whenever an object is sealed.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    objects: Mutex<HashMap<ObjectId, Arc<[u8]>>>,
    sealed: Condvar,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` has been sealed here.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.inner.objects.lock().contains_key(id)
    }
}

impl Store for MemoryStore {
    fn create(&self, id: ObjectId, size: usize) -> Result<BlobMut, Error> {
        if self.contains(&id) {
            return Err(Error::Exists(id));
        }

        Ok(BlobMut::new(id, size))
    }

    fn seal(&self, blob: BlobMut) -> Result<Blob, Error> {
        let BlobMut { id, data } = blob;
        let data: Arc<[u8]> = Arc::from(data);

        {
            let mut objects = self.inner.objects.lock();
            if objects.contains_key(&id) {
                return Err(Error::Exists(id));
            }
            objects.insert(id, Arc::clone(&data));
        }
        self.inner.sealed.notify_all();

        tracing::debug!(object = %id, size = data.len(), "sealed object");
        Ok(Blob { id, data })
    }

    fn get(&self, id: &ObjectId, timeout: Option<Duration>) -> Result<Blob, Error> {
        let mut objects = self.inner.objects.lock();
        loop {
            if let Some(data) = objects.get(id) {
                return Ok(Blob {
                    id: *id,
                    data: Arc::clone(data),
                });
            }

            match timeout {
                None => self.inner.sealed.wait(&mut objects),
                Some(timeout) => {
                    if self
                        .inner
                        .sealed
                        .wait_for(&mut objects, timeout)
                        .timed_out()
                        && !objects.contains_key(id)
                    {
                        return Err(Error::Timeout(*id));
                    }
                },
            }
        }
    }
}
