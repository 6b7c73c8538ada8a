//! # MirrorSync Codec
//!
//! The structured writer/reader underneath MirrorSync replication messages.
//!
//! Replicated nodes write themselves into a [`Value`] tree (named key/value
//! pairs, arrays, nested maps) and read themselves back from one. This crate
//! turns those trees into bytes with deterministic CBOR, so that identical
//! messages always produce identical bytes.
//!
//! ## Canonical CBOR Rules
//!
//! - Maps are sorted by key (bytewise comparison of encoded keys)
//! - Integers use shortest encoding
//! - Floats are encoded as 64-bit doubles; NaN is rejected
//! - Strings must be UTF-8
//! - No indefinite-length items
//!
//! ## Usage
//!
//! ```
//! use mirrorsync_codec::{to_canonical_cbor, from_cbor, Value};
//!
//! let value = Value::object([("x", Value::Integer(5))]);
//! let bytes = to_canonical_cbor(&value).unwrap();
//!
//! let decoded: Value = from_cbor(&bytes).unwrap();
//! assert_eq!(value, decoded);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod json;
mod value;

pub use decoder::{from_cbor, CanonicalDecoder};
pub use encoder::{to_canonical_cbor, CanonicalEncoder};
pub use error::{CodecError, CodecResult};
pub use json::{from_json, to_json};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Integer),
            (-1.0e9f64..1.0e9).prop_map(Value::Float),
            "[a-z]{0,8}".prop_map(Value::Text),
            prop::collection::vec(any::<u8>(), 0..8).prop_map(Value::Bytes),
        ];
        leaf.prop_recursive(3, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(|m| {
                    Value::map(m.into_iter().map(|(k, v)| (Value::Text(k), v)).collect())
                }),
            ]
        })
    }

    proptest! {
        #[test]
        fn canonical_roundtrip(value in arb_value()) {
            let bytes = to_canonical_cbor(&value).unwrap();
            let decoded = from_cbor(&bytes).unwrap();
            prop_assert_eq!(&decoded, &value);
            // Re-encoding is byte-identical.
            prop_assert_eq!(to_canonical_cbor(&decoded).unwrap(), bytes);
        }
    }

    #[test]
    fn output_is_standard_cbor() {
        let value = Value::object([
            ("size", Value::Integer(3)),
            ("values", Value::Array(vec![Value::Float(0.5), Value::Text("hi".into())])),
        ]);
        let bytes = to_canonical_cbor(&value).unwrap();

        let parsed: ciborium::value::Value = ciborium::de::from_reader(bytes.as_slice()).unwrap();
        let map = parsed.as_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[0].0.as_text(), Some("size"));
        assert_eq!(map[1].1.as_array().map(Vec::len), Some(2));
    }
}
