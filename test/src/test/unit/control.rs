// Copyright © 2022 The Radicle Link Contributors
//
// This file is part of radicle-link, distributed under the GPLv3 with Radicle
// Linking Exception. For full terms see the included LICENSE file.

use std::{
    net::{TcpListener, TcpStream},
    sync::Arc,
    thread,
};

use fabric::{
    net::{
        codec::CborStream,
        control::{self, rpc},
        transfers::Transfers,
    },
    store::{MemoryStore, Store as _},
    Host,
    ObjectId,
};

use crate::logging;

fn holder_of(object: ObjectId, payload: &[u8]) -> MemoryStore {
    let store = MemoryStore::new();
    let mut blob = store.create(object, payload.len()).unwrap();
    blob.as_mut_slice().copy_from_slice(payload);
    store.seal(blob).unwrap();
    store
}

fn ask(port: u16, object: ObjectId) -> bool {
    let mut stream = CborStream::new(TcpStream::connect(("127.0.0.1", port)).unwrap());
    stream
        .send(rpc::Pull {
            object,
            puller: Host::from("127.0.0.1"),
        })
        .unwrap();
    let rpc::PullResponse { ok } = stream.recv().unwrap();
    ok
}

#[test]
fn a_holder_mid_transfer_replies_busy() {
    logging::init();

    let object = ObjectId::random();
    let store = holder_of(object, b"contended");
    let transfers = Transfers::new();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = control::Server::new(Arc::new(store), transfers.clone(), 1);
    thread::spawn(move || server.serve(listener));

    // occupy the object's outbound slot, as a running transfer would
    let permit = transfers.try_begin(object).unwrap();
    assert!(!ask(port, object));

    drop(permit)
}

#[test]
fn a_failed_bulk_push_is_reported_and_releases_the_slot() {
    logging::init();

    let object = ObjectId::random();
    let store = holder_of(object, b"undeliverable");
    let transfers = Transfers::new();

    // a bulk port nothing listens on: the push must fail, the reply must be
    // a negative one, and the slot must be free again afterwards
    let dead_port = {
        let probe = TcpListener::bind("127.0.0.1:0").unwrap();
        probe.local_addr().unwrap().port()
    };

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = control::Server::new(Arc::new(store), transfers.clone(), dead_port);
    thread::spawn(move || server.serve(listener));

    assert!(!ask(port, object));
    assert!(transfers.try_begin(object).is_some())
}
