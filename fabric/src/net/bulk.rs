// Copyright © 2022 The Radicle Link Contributors
//
// This file is part of radicle-link, distributed under the GPLv3 with Radicle
// Linking Exception. For full terms see the included LICENSE file.

//! Point-to-point blob streaming.
//!
//! Wire format, sender to receiver: the 20-byte binary object id, the object
//! size as a little-endian signed 64-bit integer, then the payload. The
//! receiver answers with a NUL-terminated `"OK"` once the blob is sealed on
//! its side.

use std::{
    convert::TryFrom as _,
    io::{self, Read, Write},
    net::TcpListener,
    sync::Arc,
    thread,
};

use thiserror::Error;

use crate::{
    object_id::{ObjectId, OBJECT_ID_LENGTH},
    store::{self, Blob, Store},
};

/// Acknowledgement trailer.
const ACK: [u8; 3] = *b"OK\0";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("peer acknowledged with {0:?} instead of \"OK\"")]
    Ack([u8; 3]),

    #[error("object of {0} bytes exceeds what the size field can carry")]
    Oversized(usize),

    #[error("invalid object size on the wire: {0}")]
    Size(i64),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Store(#[from] store::Error),
}

/// Stream `blob` over `sock` and wait for the receiver's acknowledgement.
///
/// The acknowledgement doubles as proof that the receiver has sealed the
/// object; only after it arrives may the control plane report the pull as
/// complete.
pub fn push<S>(mut sock: S, blob: &Blob) -> Result<(), Error>
where
    S: Read + Write,
{
    let size = i64::try_from(blob.len()).map_err(|_| Error::Oversized(blob.len()))?;

    sock.write_all(blob.id().as_bytes())?;
    sock.write_all(&size.to_le_bytes())?;
    sock.write_all(blob)?;
    sock.flush()?;

    let mut ack = [0u8; ACK.len()];
    sock.read_exact(&mut ack)?;
    if ack != ACK {
        return Err(Error::Ack(ack));
    }

    Ok(())
}

/// Receive one object frame from `sock` into `store`, seal it, acknowledge.
///
/// Short reads are the norm: the payload loop keeps `read`ing into the blob
/// until it is full. A failure at any point before sealing discards the
/// partial blob.
pub fn receive<S, T>(mut sock: S, store: &T) -> Result<Blob, Error>
where
    S: Read + Write,
    T: Store,
{
    let mut id = [0u8; OBJECT_ID_LENGTH];
    sock.read_exact(&mut id)?;
    let object = ObjectId::from(id);

    let mut size_bytes = [0u8; 8];
    sock.read_exact(&mut size_bytes)?;
    let wire_size = i64::from_le_bytes(size_bytes);
    let size = usize::try_from(wire_size).map_err(|_| Error::Size(wire_size))?;

    let mut blob = store.create(object, size)?;
    let buf = blob.as_mut_slice();
    let mut cursor = 0;
    while cursor < size {
        let n = sock.read(&mut buf[cursor..])?;
        if n == 0 {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        cursor += n;
    }

    let blob = store.seal(blob)?;

    sock.write_all(&ACK)?;
    sock.flush()?;

    tracing::debug!(object = %object, size, "received object");
    Ok(blob)
}

/// Bulk-port accept loop.
///
/// Each accepted connection is handed off to its own thread, so multiple
/// inbound transfers make progress concurrently. `on_sealed` runs once a blob
/// has been sealed locally; the peer uses it to publish the object's new
/// location and fan out the completion event.
pub struct Server<S, F> {
    store: Arc<S>,
    on_sealed: Arc<F>,
}

impl<S, F> Server<S, F>
where
    S: Store + Send + Sync + 'static,
    F: Fn(ObjectId) + Send + Sync + 'static,
{
    pub fn new(store: Arc<S>, on_sealed: F) -> Self {
        Self {
            store,
            on_sealed: Arc::new(on_sealed),
        }
    }

    pub fn serve(self, listener: TcpListener) {
        for incoming in listener.incoming() {
            match incoming {
                Ok(sock) => {
                    let store = Arc::clone(&self.store);
                    let on_sealed = Arc::clone(&self.on_sealed);
                    thread::spawn(move || match receive(sock, store.as_ref()) {
                        Ok(blob) => on_sealed(blob.id()),
                        Err(e) => tracing::warn!(err = %e, "inbound transfer failed"),
                    });
                },
                Err(e) => {
                    tracing::error!(err = ?e, "error accepting bulk connection");
                    break;
                },
            }
        }
    }
}
