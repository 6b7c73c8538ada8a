//! Wire message keys and shape helpers shared by every node kind.

use crate::error::{MirrorError, MirrorResult};
use mirrorsync_codec::Value;

/// Sparse update: positions (or map keys) carried in `values`.
pub const INDICES: &str = "indices";
/// Element values, parallel to `indices` or positional.
pub const VALUES: &str = "values";
/// Element count of a full collection payload.
pub const SIZE: &str = "size";
/// Map keys of a full map payload, parallel to `values`.
pub const KEYS: &str = "keys";
/// Registry tag of a polymorphic reference.
pub const TYPE: &str = "type";
/// Referent message of a polymorphic reference.
pub const VALUE: &str = "value";

/// Borrow a message as a map.
pub fn expect_map(message: &Value) -> MirrorResult<&[(Value, Value)]> {
    message
        .as_map()
        .ok_or_else(|| MirrorError::type_mismatch("map", message))
}

/// Borrow a message as an array.
pub fn expect_array(message: &Value) -> MirrorResult<&[Value]> {
    message
        .as_array()
        .ok_or_else(|| MirrorError::type_mismatch("array", message))
}

/// Read a non-negative integer as a position or length.
pub fn expect_index(value: &Value) -> MirrorResult<usize> {
    let n = value
        .as_integer()
        .ok_or_else(|| MirrorError::type_mismatch("integer", value))?;
    usize::try_from(n).map_err(|_| MirrorError::IntegerOutOfRange {
        value: n,
        target: "usize",
    })
}

/// Encode a position or length.
pub fn index_value(index: usize) -> Value {
    Value::from(index)
}

/// Build a full collection payload.
pub fn full_payload(values: Vec<Value>) -> Value {
    Value::object([
        (SIZE, index_value(values.len())),
        (VALUES, Value::Array(values)),
    ])
}

/// Build a sparse collection payload from parallel index and value lists.
pub fn sparse_payload(indices: Vec<Value>, values: Vec<Value>) -> Value {
    Value::object([(INDICES, Value::Array(indices)), (VALUES, Value::Array(values))])
}

/// A collection payload taken apart.
#[derive(Debug)]
pub enum CollectionPayload<'a> {
    /// Apply values at the given positions/keys only.
    Sparse {
        /// Addressed positions or keys.
        indices: &'a [Value],
        /// New values, parallel to `indices`.
        values: &'a [Value],
    },
    /// Apply values positionally, then shrink to `size`.
    Full {
        /// Declared element count, when present.
        size: Option<usize>,
        /// Map keys, for map payloads.
        keys: Option<&'a [Value]>,
        /// Element values.
        values: &'a [Value],
    },
}

impl<'a> CollectionPayload<'a> {
    /// Parse a collection message.
    pub fn parse(message: &'a Value) -> MirrorResult<Self> {
        expect_map(message)?;
        let values = match message.get(VALUES) {
            Some(values) => expect_array(values)?,
            None => &[],
        };

        if let Some(indices) = message.get(INDICES) {
            let indices = expect_array(indices)?;
            if indices.len() != values.len() {
                return Err(MirrorError::malformed(format!(
                    "{} indices but {} values",
                    indices.len(),
                    values.len()
                )));
            }
            return Ok(Self::Sparse { indices, values });
        }

        let size = message.get(SIZE).map(expect_index).transpose()?;
        let keys = message.get(KEYS).map(expect_array).transpose()?;
        if let Some(keys) = keys {
            if keys.len() != values.len() {
                return Err(MirrorError::malformed(format!(
                    "{} keys but {} values",
                    keys.len(),
                    values.len()
                )));
            }
        }
        if let Some(size) = size {
            if size > values.len() {
                return Err(MirrorError::malformed(format!(
                    "size {size} but only {} values",
                    values.len()
                )));
            }
        }
        Ok(Self::Full { size, keys, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sparse() {
        let msg = sparse_payload(vec![Value::Integer(1)], vec![Value::Integer(10)]);
        match CollectionPayload::parse(&msg).unwrap() {
            CollectionPayload::Sparse { indices, values } => {
                assert_eq!(indices, &[Value::Integer(1)]);
                assert_eq!(values, &[Value::Integer(10)]);
            }
            other => panic!("expected sparse, got {other:?}"),
        }
    }

    #[test]
    fn parse_full() {
        let msg = full_payload(vec![Value::Integer(0), Value::Integer(1)]);
        match CollectionPayload::parse(&msg).unwrap() {
            CollectionPayload::Full { size, keys, values } => {
                assert_eq!(size, Some(2));
                assert!(keys.is_none());
                assert_eq!(values.len(), 2);
            }
            other => panic!("expected full, got {other:?}"),
        }
    }

    #[test]
    fn reject_mismatched_lengths() {
        let msg = sparse_payload(vec![Value::Integer(1), Value::Integer(2)], vec![Value::Null]);
        assert!(matches!(
            CollectionPayload::parse(&msg),
            Err(MirrorError::MalformedMessage { .. })
        ));
    }

    #[test]
    fn reject_negative_index() {
        assert!(matches!(
            expect_index(&Value::Integer(-1)),
            Err(MirrorError::IntegerOutOfRange { .. })
        ));
    }

    #[test]
    fn reject_non_map() {
        assert!(matches!(
            CollectionPayload::parse(&Value::Integer(3)),
            Err(MirrorError::TypeMismatch { expected: "map", .. })
        ));
    }
}
