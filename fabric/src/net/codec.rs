// Copyright © 2022 The Radicle Link Contributors
//
// This file is part of radicle-link, distributed under the GPLv3 with Radicle
// Linking Exception. For full terms see the included LICENSE file.

use std::io::{self, Read, Write};

use bytes::{Buf as _, BytesMut};
use minicbor::{Decode, Encode};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CborError {
    // Note: the error will not actually contain any io, the type parameter is
    // there due to the `Write` impl of `Vec`
    #[error(transparent)]
    Encode(#[from] minicbor::encode::Error<io::Error>),

    #[error(transparent)]
    Decode(#[from] minicbor::decode::Error),
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CborCodecError {
    #[error(transparent)]
    Cbor(#[from] CborError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// CBOR-framed messages over a blocking stream.
///
/// CBOR is self-delimiting, so no length prefix is needed: [`CborStream::recv`]
/// decodes from an internal buffer and reads from the underlying stream only
/// when the decoder runs out of input. Bytes past the first complete message
/// are kept for the next `recv`.
pub struct CborStream<S> {
    io: S,
    buf: BytesMut,
}

impl<S> CborStream<S> {
    pub fn new(io: S) -> Self {
        Self {
            io,
            buf: BytesMut::new(),
        }
    }

    pub fn into_inner(self) -> S {
        self.io
    }
}

impl<S: Write> CborStream<S> {
    pub fn send<T: Encode>(&mut self, item: T) -> Result<(), CborCodecError> {
        let bytes = minicbor::to_vec(&item).map_err(CborError::from)?;
        self.io.write_all(&bytes)?;
        self.io.flush()?;

        Ok(())
    }
}

impl<S: Read> CborStream<S> {
    pub fn recv<T>(&mut self) -> Result<T, CborCodecError>
    where
        for<'b> T: Decode<'b>,
    {
        loop {
            if !self.buf.is_empty() {
                let (res, offset) = {
                    let mut decoder = minicbor::Decoder::new(&self.buf);
                    let res = decoder.decode::<T>();
                    (res, decoder.position())
                };

                match res {
                    Ok(v) => {
                        self.buf.advance(offset);
                        return Ok(v);
                    },
                    // read more if we reach EOF prematurely
                    Err(minicbor::decode::Error::EndOfInput) => {},
                    Err(e) => return Err(CborError::from(e).into()),
                }
            }

            let mut chunk = [0u8; 4096];
            let n = self.io.read(&mut chunk)?;
            if n == 0 {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }
}
