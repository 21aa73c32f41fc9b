// Copyright © 2022 The Radicle Link Contributors
//
// This file is part of radicle-link, distributed under the GPLv3 with Radicle
// Linking Exception. For full terms see the included LICENSE file.

//! The node's interface to its local blob allocator.
//!
//! A blob is in exactly one of three states: under construction (mutable, not
//! visible to readers), sealed (immutable, visible), or absent. Sealing is the
//! commit point; a [`BlobMut`] dropped before sealing leaves no trace.

use std::{fmt, ops::Deref, sync::Arc, time::Duration};

use thiserror::Error;

use crate::object_id::ObjectId;

pub mod memory;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("object {0} already exists in the store")]
    Exists(ObjectId),

    #[error("timed out waiting for object {0}")]
    Timeout(ObjectId),
}

/// Blob allocator collaborator.
///
/// Implementations hand out mutable regions, seal them into immutable blobs,
/// and block readers until the blob they ask for has been sealed.
pub trait Store {
    /// Reserve a mutable region of `size` bytes for `id`.
    fn create(&self, id: ObjectId, size: usize) -> Result<BlobMut, Error>;

    /// Freeze `blob`. After this returns, concurrent and future [`Store::get`]
    /// calls observe the object.
    fn seal(&self, blob: BlobMut) -> Result<Blob, Error>;

    /// Fetch the sealed object `id`, blocking until it appears. A `timeout` of
    /// `None` waits forever.
    fn get(&self, id: &ObjectId, timeout: Option<Duration>) -> Result<Blob, Error>;
}

/// A sealed, immutable blob.
///
/// Cheap to clone and safe for concurrent readers.
#[derive(Clone)]
pub struct Blob {
    id: ObjectId,
    data: Arc<[u8]>,
}

impl Blob {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Deref for Blob {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("id", &self.id)
            .field("len", &self.data.len())
            .finish()
    }
}

/// A blob under construction.
///
/// Owns the region reserved by [`Store::create`]. Nothing becomes visible to
/// readers until [`Store::seal`] accepts it; dropping the handle instead
/// discards the partial object.
pub struct BlobMut {
    id: ObjectId,
    data: Box<[u8]>,
}

impl BlobMut {
    pub fn new(id: ObjectId, size: usize) -> Self {
        Self {
            id,
            data: vec![0u8; size].into_boxed_slice(),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl fmt::Debug for BlobMut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobMut")
            .field("id", &self.id)
            .field("len", &self.data.len())
            .finish()
    }
}
