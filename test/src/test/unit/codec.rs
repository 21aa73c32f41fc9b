// Copyright © 2022 The Radicle Link Contributors
//
// This file is part of radicle-link, distributed under the GPLv3 with Radicle
// Linking Exception. For full terms see the included LICENSE file.

use std::io;

use fabric::net::{
    codec::{CborCodecError, CborStream},
    control::rpc,
};

use crate::{
    io::{Script, Trickle},
    roundtrip::cbor_roundtrip,
};

fn pull() -> rpc::Pull {
    rpc::Pull {
        object: fabric::ObjectId::random(),
        puller: fabric::Host::from("192.0.2.7"),
    }
}

#[test]
fn send_recv() {
    let msg = pull();

    let mut tx = CborStream::new(Vec::new());
    tx.send(msg.clone()).unwrap();

    let mut rx = CborStream::new(io::Cursor::new(tx.into_inner()));
    assert_eq!(msg, rx.recv::<rpc::Pull>().unwrap())
}

#[test]
fn messages_queue_up_in_the_buffer() {
    let first = pull();
    let second = pull();

    let mut tx = CborStream::new(Vec::new());
    tx.send(first.clone()).unwrap();
    tx.send(second.clone()).unwrap();

    let mut rx = CborStream::new(io::Cursor::new(tx.into_inner()));
    assert_eq!(first, rx.recv::<rpc::Pull>().unwrap());
    assert_eq!(second, rx.recv::<rpc::Pull>().unwrap())
}

#[test]
fn survives_single_byte_reads() {
    let msg = pull();

    let mut tx = CborStream::new(Vec::new());
    tx.send(msg.clone()).unwrap();

    let mut rx = CborStream::new(Trickle::new(io::Cursor::new(tx.into_inner()), 1));
    assert_eq!(msg, rx.recv::<rpc::Pull>().unwrap())
}

#[test]
fn eof_mid_message_is_an_error() {
    let mut tx = CborStream::new(Vec::new());
    tx.send(pull()).unwrap();

    let mut truncated = tx.into_inner();
    truncated.truncate(truncated.len() - 1);

    let mut rx = CborStream::new(io::Cursor::new(truncated));
    assert!(matches!(
        rx.recv::<rpc::Pull>(),
        Err(CborCodecError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof
    ))
}

#[test]
fn garbage_is_a_decode_error() {
    let mut rx = CborStream::new(Script::new(vec![0xff; 16]));
    assert!(matches!(
        rx.recv::<rpc::Pull>(),
        Err(CborCodecError::Cbor(_))
    ))
}

#[test]
fn rpc_types_roundtrip() {
    cbor_roundtrip(pull());
    cbor_roundtrip(rpc::PullResponse { ok: true });
    cbor_roundtrip(rpc::PullResponse { ok: false });
}
