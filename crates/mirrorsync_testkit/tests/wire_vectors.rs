//! Wire vectors decode into the nodes that produced them.

use mirrorsync_codec::{from_cbor, to_canonical_cbor};
use mirrorsync_core::{Mirrored, MirroredList, MirroredMap, MirroredRef};
use mirrorsync_testkit::prelude::*;
use mirrorsync_testkit::{hex_decode, GoldenTest};

fn vector(id: &str) -> WireVector {
    message_vectors()
        .into_iter()
        .find(|v| v.id == id)
        .unwrap_or_else(|| panic!("no vector {id}"))
}

#[test]
fn composite_delta_applies() {
    let message = from_cbor(&hex_decode(vector("composite_delta").expected_hex)).unwrap();
    let mut p = position(1, 1);
    p.read(&message).unwrap();
    assert_eq!((*p.x(), *p.y()), (5, 1));
}

#[test]
fn list_vectors_apply_in_order() {
    let mut list = MirroredList::<i32>::from_vec(vec![7]);
    for id in ["list_full", "list_sparse"] {
        let message = from_cbor(&hex_decode(vector(id).expected_hex)).unwrap();
        list.read(&message).unwrap();
    }
    assert_eq!(list.as_slice(), &[0, 1, 5]);
}

#[test]
fn map_vector_replaces_contents() {
    let mut map = MirroredMap::<String, i32>::new();
    map.insert("z".to_string(), 26);
    let message = from_cbor(&hex_decode(vector("map_full").expected_hex)).unwrap();
    map.read(&message).unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("a"), Some(&1));
}

#[test]
fn reference_vectors_apply() {
    let mut pet = MirroredRef::<Pets>::new();
    let message = from_cbor(&hex_decode(vector("reference_full").expected_hex)).unwrap();
    pet.read(&message).unwrap();
    assert!(pet.content_equals(&MirroredRef::with_target(cat("Tom"))));

    let message = from_cbor(&hex_decode(vector("reference_null").expected_hex)).unwrap();
    pet.read(&message).unwrap();
    assert!(pet.is_none());
}

#[test]
fn vectors_match_golden_files() {
    let golden = GoldenTest::scratch("wire").with_update_mode(true);
    for v in message_vectors() {
        golden.assert_bytes(v.id, &to_canonical_cbor(&v.message).unwrap());
    }
    golden.assert_text("vectors", &export_vectors_json());

    let check = GoldenTest::new("wire", golden.dir()).with_update_mode(false);
    for v in message_vectors() {
        check.assert_bytes(v.id, &hex_decode(v.expected_hex));
    }
}
