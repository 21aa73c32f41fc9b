// Copyright © 2022 The Radicle Link Contributors
//
// This file is part of radicle-link, distributed under the GPLv3 with Radicle
// Linking Exception. For full terms see the included LICENSE file.

//! Client half of the cluster-wide object directory.
//!
//! The directory is authoritative for `object -> host` and fans completion
//! events out to subscribers. Nothing is cached locally, and each request
//! rides its own short-lived connection. Completion events come back at us
//! through a dedicated notification listener, see [`listen`].

use std::{
    io,
    net::{TcpListener, TcpStream},
    thread,
};

use thiserror::Error;

use crate::{
    host::Host,
    net::codec::{CborCodecError, CborStream},
    object_id::ObjectId,
};

pub mod rpc;

mod sub;
pub use sub::{Subscription, Subscriptions};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The directory processed the request, but declined it.
    #[error("directory declined {0} request")]
    Declined(&'static str),

    #[error(transparent)]
    Codec(#[from] CborCodecError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Where the directory service lives.
#[derive(Clone, Debug)]
pub struct Config {
    pub host: Host,
    pub port: u16,
}

#[derive(Clone)]
pub struct Directory {
    config: Config,
    local: Host,
    subscriptions: Subscriptions,
}

impl Directory {
    /// A client identifying itself as `local`, talking to the directory at
    /// `config`.
    pub fn new(config: Config, local: Host) -> Self {
        Self {
            config,
            local,
            subscriptions: Subscriptions::new(),
        }
    }

    /// The registry the notification listener feeds.
    pub fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }

    /// Record that `object` is now available at `host`.
    ///
    /// Durable at the directory before this returns.
    pub fn publish(&self, object: ObjectId, host: Host) -> Result<(), Error> {
        tracing::info!(object = %object, host = %host, "publishing object location");
        let rpc::Done { ok } = self.request(rpc::Request::PublishLocation { object, host })?;
        if !ok {
            return Err(Error::Declined("publish"));
        }

        Ok(())
    }

    /// The currently recorded holder of `object`, if any.
    ///
    /// Does not wait for the object to appear.
    pub fn lookup(&self, object: ObjectId) -> Result<Option<Host>, Error> {
        let rpc::Location { host } = self.request(rpc::Request::LookupLocation { object })?;
        Ok(host)
    }

    /// Register interest in completion events for `objects`.
    ///
    /// With `include_existing`, objects the directory already has a location
    /// for are delivered as if their notification had just arrived, so a
    /// subscriber cannot miss an object completed before it subscribed.
    pub fn subscribe<I>(&self, objects: I, include_existing: bool) -> Result<Subscription, Error>
    where
        I: IntoIterator<Item = ObjectId>,
    {
        let objects: Vec<ObjectId> = objects.into_iter().collect();
        let sub = self.subscriptions.insert(objects.iter().copied());

        for object in &objects {
            let rpc::Done { ok } = self.request(rpc::Request::Subscribe {
                subscriber: self.local.clone(),
                object: *object,
            })?;
            if !ok {
                return Err(Error::Declined("subscribe"));
            }
        }

        if include_existing {
            for object in objects {
                if self.lookup(object)?.is_some() {
                    sub.notify(object);
                }
            }
        }

        Ok(sub)
    }

    /// Detach `sub` and withdraw the interest it still holds at the
    /// directory.
    pub fn unsubscribe(&self, sub: Subscription) -> Result<(), Error> {
        self.subscriptions.remove(&sub);
        for object in sub.pending() {
            let rpc::Done { ok } = self.request(rpc::Request::Unsubscribe {
                subscriber: self.local.clone(),
                object,
            })?;
            if !ok {
                return Err(Error::Declined("unsubscribe"));
            }
        }

        Ok(())
    }

    /// Fan out "object complete" to everyone subscribed to `object`.
    pub fn publish_completion(&self, object: ObjectId) -> Result<(), Error> {
        let rpc::Done { ok } = self.request(rpc::Request::Complete { object })?;
        if !ok {
            return Err(Error::Declined("completion"));
        }

        Ok(())
    }

    fn request<T>(&self, request: rpc::Request) -> Result<T, Error>
    where
        for<'b> T: minicbor::Decode<'b>,
    {
        let sock = TcpStream::connect((self.config.host.as_str(), self.config.port))?;
        let mut stream = CborStream::new(sock);
        stream.send(request)?;

        Ok(stream.recv()?)
    }
}

/// Accept loop for the notification-listen port.
///
/// Every [`rpc::ObjectReady`] the directory pushes at us is dispatched to
/// every live subscription in `subscriptions`.
pub fn listen(listener: TcpListener, subscriptions: Subscriptions) {
    for incoming in listener.incoming() {
        match incoming {
            Ok(sock) => {
                let subscriptions = subscriptions.clone();
                thread::spawn(move || {
                    if let Err(e) = notified(sock, &subscriptions) {
                        tracing::warn!(err = %e, "notification connection error");
                    }
                });
            },
            Err(e) => {
                tracing::error!(err = ?e, "error accepting notification connection");
                break;
            },
        }
    }
}

fn notified(sock: TcpStream, subscriptions: &Subscriptions) -> Result<(), Error> {
    let mut stream = CborStream::new(sock);
    let rpc::ObjectReady { object } = stream.recv()?;
    tracing::debug!(object = %object, "object ready");

    subscriptions.dispatch(object);
    stream.send(rpc::Done { ok: true })?;

    Ok(())
}
