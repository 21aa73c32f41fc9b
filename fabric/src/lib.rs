// Copyright © 2022 The Radicle Link Contributors
//
// This file is part of radicle-link, distributed under the GPLv3 with Radicle
// Linking Exception. For full terms see the included LICENSE file.

//! A peer-to-peer transfer fabric for large immutable in-memory objects.
//!
//! Nodes fill and seal blobs in a local [`store::Store`], announce them to the
//! cluster-wide [`directory`], and stream them directly to peers when asked to
//! via the pull control plane in [`net`]. [`reduce`] plans tree-of-chains
//! schedules for composing many per-node contributions into one.

pub mod directory;
pub mod host;
pub mod net;
pub mod object_id;
pub mod peer;
pub mod reduce;
pub mod store;

pub use host::Host;
pub use object_id::ObjectId;
pub use peer::Peer;
