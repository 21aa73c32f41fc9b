// Copyright © 2022 The Radicle Link Contributors
//
// This file is part of radicle-link, distributed under the GPLv3 with Radicle
// Linking Exception. For full terms see the included LICENSE file.

use std::{convert::TryFrom, fmt, str::FromStr};

use minicbor::{decode, encode, Decode, Decoder, Encode, Encoder};
use serde::{de::Visitor, Deserialize, Deserializer, Serialize, Serializer};

/// Length in bytes of the binary form of an [`ObjectId`].
pub const OBJECT_ID_LENGTH: usize = 20;

/// Opaque identifier of an immutable object.
///
/// Assigned by the producer, not derived from the content. The canonical
/// encodings are the 20-byte binary form and the 40-character lowercase hex
/// form; the two round-trip losslessly. On the wire (CBOR) an id is a 20-byte
/// byte string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; OBJECT_ID_LENGTH]);

impl ObjectId {
    /// A fresh, randomly assigned id.
    pub fn random() -> Self {
        use rand::Rng as _;

        let mut bytes = [0u8; OBJECT_ID_LENGTH];
        rand::thread_rng().fill(&mut bytes[..]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, conversion::Error> {
        Self::try_from(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, conversion::Error> {
        if s.len() != OBJECT_ID_LENGTH * 2 {
            return Err(conversion::Error::UnexpectedInputLength(s.len()));
        }

        let bytes = hex::decode(s)?;
        Self::try_from(bytes.as_slice())
    }

    pub fn as_bytes(&self) -> &[u8; OBJECT_ID_LENGTH] {
        &self.0
    }

    /// Canonical textual representation: lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

pub mod conversion {
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[non_exhaustive]
    pub enum Error {
        #[error("unexpected input length: {0}")]
        UnexpectedInputLength(usize),

        #[error("invalid hex encoding: {0}")]
        Hex(#[from] hex::FromHexError),
    }
}

impl From<[u8; OBJECT_ID_LENGTH]> for ObjectId {
    fn from(bytes: [u8; OBJECT_ID_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for ObjectId {
    type Error = conversion::Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != OBJECT_ID_LENGTH {
            return Err(conversion::Error::UnexpectedInputLength(bytes.len()));
        }

        let mut id = [0u8; OBJECT_ID_LENGTH];
        id.copy_from_slice(bytes);
        Ok(Self(id))
    }
}

impl AsRef<[u8]> for ObjectId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for ObjectId {
    type Err = conversion::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl Encode for ObjectId {
    fn encode<W: encode::Write>(
        &self,
        e: &mut Encoder<W>,
    ) -> Result<(), encode::Error<W::Error>> {
        e.bytes(&self.0)?;
        Ok(())
    }
}

impl<'b> Decode<'b> for ObjectId {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let bytes = d.bytes()?;
        Self::try_from(bytes).map_err(|_| decode::Error::Message("expected 20-byte object id"))
    }
}

impl Serialize for ObjectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ObjectIdVisitor;

        impl<'de> Visitor<'de> for ObjectIdVisitor {
            type Value = ObjectId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a hex-encoded ObjectId")
            }

            fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                ObjectId::from_hex(s).map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_str(ObjectIdVisitor)
    }
}
