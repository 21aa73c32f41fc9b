// Copyright © 2022 The Radicle Link Contributors
//
// This file is part of radicle-link, distributed under the GPLv3 with Radicle
// Linking Exception. For full terms see the included LICENSE file.

use proptest::prelude::*;

use fabric::{directory::rpc as directory, net::control::rpc as control};

use crate::{
    gen::{gen_host, gen_object_id},
    roundtrip::{cbor_roundtrip, json_roundtrip, str_roundtrip},
};

proptest! {
    #[test]
    fn object_id_encodings(object in gen_object_id()) {
        cbor_roundtrip(object);
        str_roundtrip(object);
        json_roundtrip(object);
    }

    #[test]
    fn host_encodings(host in gen_host()) {
        cbor_roundtrip(host.clone());
        str_roundtrip(host.clone());
        json_roundtrip(host);
    }

    #[test]
    fn control_messages(object in gen_object_id(), puller in gen_host(), ok in any::<bool>()) {
        cbor_roundtrip(control::Pull { object, puller });
        cbor_roundtrip(control::PullResponse { ok });
    }

    #[test]
    fn directory_messages(object in gen_object_id(), host in gen_host(), ok in any::<bool>()) {
        cbor_roundtrip(directory::Request::PublishLocation { object, host: host.clone() });
        cbor_roundtrip(directory::Request::LookupLocation { object });
        cbor_roundtrip(directory::Request::Subscribe { subscriber: host.clone(), object });
        cbor_roundtrip(directory::Request::Unsubscribe { subscriber: host.clone(), object });
        cbor_roundtrip(directory::Request::Complete { object });
        cbor_roundtrip(directory::Done { ok });
        cbor_roundtrip(directory::Location { host: Some(host) });
        cbor_roundtrip(directory::Location { host: None });
        cbor_roundtrip(directory::ObjectReady { object });
    }
}
