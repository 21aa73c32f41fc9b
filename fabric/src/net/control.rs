// Copyright © 2022 The Radicle Link Contributors
//
// This file is part of radicle-link, distributed under the GPLv3 with Radicle
// Linking Exception. For full terms see the included LICENSE file.

//! The pull control plane.
//!
//! A pull rides a short-lived control connection: one [`rpc::Pull`] request,
//! one [`rpc::PullResponse`]. The holder couples the response to the bulk
//! transfer deliberately: a positive reply is not sent until the bytes have
//! been streamed and acknowledged, which lets the requester treat `ok = true`
//! as "the bytes are now mine".

use std::{
    io,
    net::{TcpListener, TcpStream},
    sync::Arc,
    thread,
    time::Duration,
};

use thiserror::Error;

use crate::{
    host::Host,
    net::{
        bulk,
        codec::{CborCodecError, CborStream},
        transfers::Transfers,
    },
    object_id::ObjectId,
    store::{self, Store},
};

pub mod rpc;

/// Delay between retries when the holder reports it is busy.
const BUSY_RETRY_DELAY: Duration = Duration::from_millis(1);

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Bulk(#[from] bulk::Error),

    #[error(transparent)]
    Codec(#[from] CborCodecError),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Store(#[from] store::Error),
}

/// Originate a pull: ask the holder at `remote` to stream `object` to
/// `puller`'s bulk port.
///
/// A busy holder answers with a fast local rejection, not a failure: we sleep
/// [`BUSY_RETRY_DELAY`] and ask again, indefinitely. Each attempt is its own
/// connection.
pub fn pull(
    remote: &Host,
    control_port: u16,
    object: ObjectId,
    puller: Host,
) -> Result<(), Error> {
    loop {
        let sock = TcpStream::connect((remote.as_str(), control_port))?;
        let mut stream = CborStream::new(sock);
        stream.send(rpc::Pull {
            object,
            puller: puller.clone(),
        })?;

        let rpc::PullResponse { ok } = stream.recv()?;
        if ok {
            tracing::debug!(object = %object, remote = %remote, "pull complete");
            return Ok(());
        }

        tracing::trace!(object = %object, remote = %remote, "holder busy, retrying");
        thread::sleep(BUSY_RETRY_DELAY);
    }
}

/// Serving half of the control plane.
pub struct Server<S> {
    store: Arc<S>,
    transfers: Transfers,
    bulk_port: u16,
}

impl<S> Server<S>
where
    S: Store + Send + Sync + 'static,
{
    pub fn new(store: Arc<S>, transfers: Transfers, bulk_port: u16) -> Self {
        Self {
            store,
            transfers,
            bulk_port,
        }
    }

    /// Accept loop; each control connection is handled on its own thread.
    pub fn serve(self, listener: TcpListener) {
        let this = Arc::new(self);
        for incoming in listener.incoming() {
            match incoming {
                Ok(sock) => {
                    let this = Arc::clone(&this);
                    thread::spawn(move || {
                        if let Err(e) = this.handle(sock) {
                            tracing::warn!(err = %e, "control connection error");
                        }
                    });
                },
                Err(e) => {
                    tracing::error!(err = ?e, "error accepting control connection");
                    break;
                },
            }
        }
    }

    fn handle(&self, sock: TcpStream) -> Result<(), Error> {
        let mut stream = CborStream::new(sock);
        let rpc::Pull { object, puller } = stream.recv()?;
        tracing::info!(object = %object, puller = %puller, "received pull request");

        let permit = match self.transfers.try_begin(object) {
            Some(permit) => permit,
            None => {
                tracing::debug!(object = %object, "transfer already in flight, rejecting");
                stream.send(rpc::PullResponse { ok: false })?;
                return Ok(());
            },
        };

        let ok = match self.push(&puller, object) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(err = %e, object = %object, puller = %puller, "bulk push failed");
                false
            },
        };
        drop(permit);

        tracing::info!(object = %object, puller = %puller, ok, "finished pull request");
        stream.send(rpc::PullResponse { ok })?;

        Ok(())
    }

    fn push(&self, puller: &Host, object: ObjectId) -> Result<(), Error> {
        let blob = self.store.get(&object, None)?;
        let sock = TcpStream::connect((puller.as_str(), self.bulk_port))?;
        bulk::push(sock, &blob)?;

        Ok(())
    }
}
