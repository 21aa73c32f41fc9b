// Copyright © 2022 The Radicle Link Contributors
//
// This file is part of radicle-link, distributed under the GPLv3 with Radicle
// Linking Exception. For full terms see the included LICENSE file.

//! Per-node assembly of the transfer fabric.
//!
//! A [`Peer`] owns the node's store handle, directory client and transfer
//! book-keeping. [`Peer::bind`] claims the three listening sockets,
//! [`Bound::accept`] starts the accept loops. Construct the peer before
//! starting any other thread and keep it alive until the loops are joined.

use std::{
    io,
    net::{SocketAddr, TcpListener},
    sync::Arc,
    thread::{self, JoinHandle},
};

use thiserror::Error;

use crate::{
    directory::{self, Directory, Subscription},
    host::Host,
    net::{bulk, control, transfers::Transfers},
    object_id::ObjectId,
    store::{self, Blob, Store},
};

/// The three fixed logical ports of a node.
///
/// Values are deployment configuration: peers exchange bare hosts on the wire
/// and derive connect targets from their own copy of this.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ports {
    /// Pull-control requests, peer to peer.
    pub control: u16,
    /// Blob streams, peer to peer.
    pub bulk: u16,
    /// Completion events, directory to peer.
    pub notifications: u16,
}

impl Default for Ports {
    fn default() -> Self {
        Self {
            control: 50051,
            bulk: 6666,
            notifications: 6667,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    /// This node's address, as published to the directory.
    pub host: Host,
    pub ports: Ports,
    pub directory: directory::Config,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BindError {
    #[error("failed to bind {what} listener at {host}:{port}")]
    Bind {
        what: &'static str,
        host: Host,
        port: u16,
        source: io::Error,
    },
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PutError {
    #[error(transparent)]
    Directory(#[from] directory::Error),

    #[error(transparent)]
    Store(#[from] store::Error),
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GetError {
    /// The directory has no record of the object. Callers may subscribe and
    /// retry, or give up.
    #[error("object {0} is not known to the directory")]
    UnknownObject(ObjectId),

    #[error(transparent)]
    Directory(#[from] directory::Error),

    #[error(transparent)]
    Pull(#[from] control::Error),

    #[error(transparent)]
    Store(#[from] store::Error),
}

/// A node of the transfer fabric.
pub struct Peer<S> {
    config: Config,
    store: Arc<S>,
    directory: Directory,
    transfers: Transfers,
}

impl<S> Clone for Peer<S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            store: Arc::clone(&self.store),
            directory: self.directory.clone(),
            transfers: self.transfers.clone(),
        }
    }
}

impl<S> Peer<S>
where
    S: Store + Send + Sync + 'static,
{
    pub fn new(config: Config, store: S) -> Self {
        let directory = Directory::new(config.directory.clone(), config.host.clone());
        Self {
            config,
            store: Arc::new(store),
            directory,
            transfers: Transfers::new(),
        }
    }

    pub fn host(&self) -> &Host {
        &self.config.host
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Claim the control, bulk and notification listeners.
    pub fn bind(&self) -> Result<Bound<S>, BindError> {
        let host = &self.config.host;
        let control = bind("control", host, self.config.ports.control)?;
        let bulk = bind("bulk", host, self.config.ports.bulk)?;
        let notifications = bind("notifications", host, self.config.ports.notifications)?;

        Ok(Bound {
            peer: self.clone(),
            control,
            bulk,
            notifications,
        })
    }

    /// Create, seal and publish a fresh object holding `data`.
    #[tracing::instrument(skip(self, data), fields(host = %self.config.host))]
    pub fn put(&self, data: &[u8]) -> Result<ObjectId, PutError> {
        let object = ObjectId::random();
        self.put_with(object, data)?;
        Ok(object)
    }

    /// Like [`Peer::put`], with a caller-assigned id.
    pub fn put_with(&self, object: ObjectId, data: &[u8]) -> Result<(), PutError> {
        let mut blob = self.store.create(object, data.len())?;
        blob.as_mut_slice().copy_from_slice(data);
        self.store.seal(blob)?;
        self.directory.publish(object, self.config.host.clone())?;

        Ok(())
    }

    /// Announce that `object` is complete, waking its subscribers.
    pub fn complete(&self, object: ObjectId) -> Result<(), directory::Error> {
        self.directory.publish_completion(object)
    }

    /// Fetch `object`, pulling it from its holder unless it is already local.
    #[tracing::instrument(skip(self, object), fields(host = %self.config.host, object = %object))]
    pub fn get(&self, object: ObjectId) -> Result<Blob, GetError> {
        let holder = self
            .directory
            .lookup(object)?
            .ok_or(GetError::UnknownObject(object))?;
        tracing::debug!(holder = %holder, "resolved object location");

        if holder != self.config.host {
            control::pull(
                &holder,
                self.config.ports.control,
                object,
                self.config.host.clone(),
            )?;
        }

        Ok(self.store.get(&object, None)?)
    }

    /// Subscribe to completion events for `objects`.
    pub fn subscribe<I>(
        &self,
        objects: I,
        include_existing: bool,
    ) -> Result<Subscription, directory::Error>
    where
        I: IntoIterator<Item = ObjectId>,
    {
        self.directory.subscribe(objects, include_existing)
    }

    /// Detach a subscription obtained from [`Peer::subscribe`].
    pub fn unsubscribe(&self, sub: Subscription) -> Result<(), directory::Error> {
        self.directory.unsubscribe(sub)
    }
}

fn bind(what: &'static str, host: &Host, port: u16) -> Result<TcpListener, BindError> {
    TcpListener::bind((host.as_str(), port)).map_err(|source| BindError::Bind {
        what,
        host: host.clone(),
        port,
        source,
    })
}

/// A peer with its listeners bound, but not yet serving.
///
/// Mainly useful to learn the OS-chosen addresses when configured with port
/// zero.
pub struct Bound<S> {
    peer: Peer<S>,
    control: TcpListener,
    bulk: TcpListener,
    notifications: TcpListener,
}

impl<S> Bound<S>
where
    S: Store + Send + Sync + 'static,
{
    pub fn listen_addrs(&self) -> io::Result<Vec<SocketAddr>> {
        Ok(vec![
            self.control.local_addr()?,
            self.bulk.local_addr()?,
            self.notifications.local_addr()?,
        ])
    }

    /// Start the accept loops.
    ///
    /// The returned handles join only if the listeners fail, which under
    /// normal operation they do not.
    pub fn accept(self) -> Vec<JoinHandle<()>> {
        let Self {
            peer,
            control,
            bulk,
            notifications,
        } = self;

        let control_srv = control::Server::new(
            Arc::clone(&peer.store),
            peer.transfers.clone(),
            peer.config.ports.bulk,
        );

        let directory = peer.directory.clone();
        let host = peer.config.host.clone();
        let bulk_srv = bulk::Server::new(Arc::clone(&peer.store), move |object| {
            // the object is sealed locally: make the location visible first,
            // then fan out completion
            if let Err(e) = directory
                .publish(object, host.clone())
                .and_then(|()| directory.publish_completion(object))
            {
                tracing::warn!(err = %e, object = %object, "failed to announce received object");
            }
        });

        let subscriptions = peer.directory.subscriptions().clone();

        vec![
            thread::Builder::new()
                .name("control".into())
                .spawn(move || control_srv.serve(control))
                .expect("failed to spawn the control accept loop"),
            thread::Builder::new()
                .name("bulk".into())
                .spawn(move || bulk_srv.serve(bulk))
                .expect("failed to spawn the bulk accept loop"),
            thread::Builder::new()
                .name("notifications".into())
                .spawn(move || directory::listen(notifications, subscriptions))
                .expect("failed to spawn the notification listener"),
        ]
    }
}
