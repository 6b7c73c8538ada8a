//! Fuzz targets for MirrorSync.
//!
//! Each target takes untrusted input and must return without panicking.
//! They can be driven by cargo-fuzz or by the proptest suites in `tests/`.

use crate::fixtures::{game_context, Player};
use mirrorsync_codec::{from_cbor, to_canonical_cbor, Value};
use mirrorsync_core::Mirrored;

/// Fuzz target for message decoding.
///
/// Arbitrary bytes either decode to a value or fail with an error.
pub fn fuzz_decode(data: &[u8]) {
    let _ = from_cbor(data);
}

/// Fuzz target for the canonical round trip.
///
/// Anything that decodes must re-encode to the same canonical bytes twice.
pub fn fuzz_roundtrip(data: &[u8]) {
    let Ok(value) = from_cbor(data) else {
        return;
    };
    let Ok(first) = to_canonical_cbor(&value) else {
        return;
    };
    let decoded = from_cbor(&first).expect("canonical output must decode");
    let second = to_canonical_cbor(&decoded).expect("decoded value must encode");
    assert_eq!(first, second, "canonical encoding is not stable");
}

/// Fuzz target for applying raw bytes to a populated context.
///
/// Garbage input may be rejected, but it must never panic, and the context
/// must still encode afterwards.
pub fn fuzz_apply(data: &[u8]) {
    let mut ctx = game_context("fuzz");
    let _ = ctx.apply(data);
    ctx.snapshot().expect("context must stay encodable");
}

/// Fuzz target for reading an arbitrary message into a player.
///
/// Exercises every node kind's read path with structurally valid but
/// semantically random input.
pub fn fuzz_read(message: &Value) {
    let mut player = crate::fixtures::sample_player("fuzz");
    let _ = player.read(message);
    player.write(false).expect("player must stay encodable");
    let _ = Player::new().read(message);
}
