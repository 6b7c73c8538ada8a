//! Wire vectors for MirrorSync messages.
//!
//! Each vector pairs a message produced by a fixture with its canonical
//! CBOR bytes. An independent implementation of the wire format can check
//! itself against the exported JSON.

use crate::fixtures::{cat, position, Board, Pets, Suit, Vitals};
use mirrorsync_codec::Value;
use mirrorsync_core::{Leaf, Mirrored, MirroredList, MirroredMap, MirroredRef};
use serde::Serialize;

/// A message and its expected encoding.
#[derive(Debug, Clone, Serialize)]
pub struct WireVector {
    /// Unique identifier for this vector.
    pub id: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// The message a node produced.
    pub message: Value,
    /// Expected canonical CBOR (hex-encoded).
    pub expected_hex: &'static str,
}

/// Messages written by nodes in known states.
pub fn message_vectors() -> Vec<WireVector> {
    vec![
        WireVector {
            id: "composite_delta",
            description: "one changed field of a COMPLEX record",
            message: {
                let mut p = position(0, 0);
                p.set_x(5);
                write_delta(&p)
            },
            expected_hex: "a1617805",
        },
        WireVector {
            id: "composite_clean",
            description: "a clean record writes an empty map",
            message: write_delta(&position(3, 4)),
            expected_hex: "a0",
        },
        WireVector {
            id: "any_policy_delta",
            description: "an ANY record writes every field once one changes",
            message: {
                let mut v = Vitals::new();
                v.mark_clean();
                v.set_health(50);
                write_delta(&v)
            },
            expected_hex: "a266656e65726779fb3ff0000000000000666865616c74681832",
        },
        WireVector {
            id: "list_full",
            description: "a restructured list writes size and every value",
            message: {
                let mut list = MirroredList::<i32>::new();
                list.set_all(vec![0, 1, 2]);
                write_delta(&list)
            },
            expected_hex: "a26473697a65036676616c75657383000102",
        },
        WireVector {
            id: "list_sparse",
            description: "a replaced list element writes its index and value",
            message: {
                let mut list = MirroredList::from_vec(vec![0i32, 1, 2]);
                list.set(2, 5);
                write_delta(&list)
            },
            expected_hex: "a26676616c756573810567696e64696365738102",
        },
        WireVector {
            id: "map_full",
            description: "a changed map rewrites size, keys and values",
            message: {
                let mut map = MirroredMap::<String, i32>::new();
                map.insert("a".to_string(), 1);
                write_delta(&map)
            },
            expected_hex: "a3646b6579738161616473697a65016676616c7565738101",
        },
        WireVector {
            id: "enum_leaf",
            description: "enums travel as their variant name",
            message: Suit::Spades.to_value(),
            expected_hex: "66537061646573",
        },
        WireVector {
            id: "reference_full",
            description: "a replaced reference writes its tag and full referent",
            message: {
                let mut pet = MirroredRef::<Pets>::new();
                pet.set(cat("Tom"));
                write_delta(&pet)
            },
            expected_hex: "a26474797065634361746576616c7565a2646e616d6563546f6d656c6976657309",
        },
        WireVector {
            id: "reference_null",
            description: "an empty reference writes null",
            message: write_delta(&MirroredRef::<Pets>::new()),
            expected_hex: "f6",
        },
        WireVector {
            id: "context_delta",
            description: "a context writes only the dirty roots",
            message: {
                let mut board = Board::new();
                board.mark_clean();
                board.set_turn(1);
                Value::object([("board", write_delta(&board))])
            },
            expected_hex: "a165626f617264a1647475726e01",
        },
    ]
}

fn write_delta<M: Mirrored>(node: &M) -> Value {
    node.write(true)
        .unwrap_or_else(|e| panic!("fixture failed to write: {e}"))
}

/// All vectors serialized as pretty JSON.
pub fn export_vectors_json() -> String {
    serde_json::to_string_pretty(&message_vectors()).unwrap_or_default()
}
