// Copyright © 2022 The Radicle Link Contributors
//
// This file is part of radicle-link, distributed under the GPLv3 with Radicle
// Linking Exception. For full terms see the included LICENSE file.

use minicbor::{Decode, Encode};

use crate::{host::Host, object_id::ObjectId};

/// Requests a node issues against the directory.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum Request {
    /// Record that `object` now lives at `host`.
    #[n(0)]
    #[cbor(array)]
    PublishLocation {
        #[n(0)]
        object: ObjectId,
        #[n(1)]
        host: Host,
    },

    #[n(1)]
    #[cbor(array)]
    LookupLocation {
        #[n(0)]
        object: ObjectId,
    },

    #[n(2)]
    #[cbor(array)]
    Subscribe {
        #[n(0)]
        subscriber: Host,
        #[n(1)]
        object: ObjectId,
    },

    #[n(3)]
    #[cbor(array)]
    Unsubscribe {
        #[n(0)]
        subscriber: Host,
        #[n(1)]
        object: ObjectId,
    },

    /// Broadcast "object complete" to every subscriber of `object`.
    #[n(4)]
    #[cbor(array)]
    Complete {
        #[n(0)]
        object: ObjectId,
    },
}

/// The directory's answer to anything but a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
#[cbor(array)]
pub struct Done {
    #[n(0)]
    pub ok: bool,
}

/// The directory's answer to [`Request::LookupLocation`].
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
#[cbor(array)]
pub struct Location {
    /// `None` if the object is unknown to the directory.
    #[n(0)]
    pub host: Option<Host>,
}

/// Completion event, pushed by the directory to a subscriber's
/// notification-listen port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
#[cbor(array)]
pub struct ObjectReady {
    #[n(0)]
    pub object: ObjectId,
}
