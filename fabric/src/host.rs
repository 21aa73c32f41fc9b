// Copyright © 2022 The Radicle Link Contributors
//
// This file is part of radicle-link, distributed under the GPLv3 with Radicle
// Linking Exception. For full terms see the included LICENSE file.

use std::{convert::Infallible, fmt, net::IpAddr, str::FromStr};

use minicbor::{decode, encode, Decode, Decoder, Encode, Encoder};
use serde::{Deserialize, Serialize};

/// Network identity of a node.
///
/// A bare host, typically an IPv4 dotted quad. The control, bulk and
/// notification ports are fixed per deployment and never travel on the wire,
/// so a `Host` is both the directory value for an object and a routing target
/// for all three logical ports.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Host(String);

impl Host {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<IpAddr> for Host {
    fn from(ip: IpAddr) -> Self {
        Self(ip.to_string())
    }
}

impl From<String> for Host {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Host {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl FromStr for Host {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_owned()))
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Encode for Host {
    fn encode<W: encode::Write>(
        &self,
        e: &mut Encoder<W>,
    ) -> Result<(), encode::Error<W::Error>> {
        e.str(&self.0)?;
        Ok(())
    }
}

impl<'b> Decode<'b> for Host {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        Ok(Self(d.str()?.to_owned()))
    }
}
