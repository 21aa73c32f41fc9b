// Copyright © 2022 The Radicle Link Contributors
//
// This file is part of radicle-link, distributed under the GPLv3 with Radicle
// Linking Exception. For full terms see the included LICENSE file.

use minicbor::{Decode, Encode};

use crate::{host::Host, object_id::ObjectId};

/// Ask the holder to stream an object back to the requester's bulk port.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
#[cbor(array)]
pub struct Pull {
    #[n(0)]
    pub object: ObjectId,

    #[n(1)]
    pub puller: Host,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
#[cbor(array)]
pub struct PullResponse {
    /// `false` means "busy, retry". `true` is sent only after the bulk
    /// transfer completed and was acknowledged, so a positive reply is proof
    /// of delivery.
    #[n(0)]
    pub ok: bool,
}
