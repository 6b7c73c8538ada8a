//! Error types for MirrorSync core.

use mirrorsync_codec::Value;
use thiserror::Error;

/// Result type for core operations.
pub type MirrorResult<T> = Result<T, MirrorError>;

/// Errors that can occur while writing or applying replication messages.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MirrorError {
    /// CBOR codec error.
    #[error("codec error: {0}")]
    Codec(#[from] mirrorsync_codec::CodecError),

    /// An enum name on the wire is not a variant of the local enum.
    #[error("unknown value {value:?} for enum {enum_name}")]
    UnknownEnumValue {
        /// Name of the local enum type.
        enum_name: &'static str,
        /// Name received on the wire.
        value: String,
    },

    /// A polymorphic type tag has no registered factory.
    #[error("no factory registered for type tag {tag:?}")]
    UnregisteredType {
        /// Tag received on the wire.
        tag: String,
    },

    /// Two factories were registered under the same tag.
    #[error("type tag {tag:?} registered twice")]
    DuplicateTypeTag {
        /// The conflicting tag.
        tag: &'static str,
    },

    /// A sparse update addressed a slot the receiver does not have.
    ///
    /// The receiver missed a structural or full message.
    #[error("sparse update for index {index} but collection has {len} slots")]
    Desync {
        /// Index named by the sparse update.
        index: usize,
        /// Current length on the receiver.
        len: usize,
    },

    /// A message value has the wrong shape.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// What the reader expected.
        expected: &'static str,
        /// Kind of value actually found.
        found: &'static str,
    },

    /// An integer does not fit the local field type.
    #[error("integer {value} out of range for {target}")]
    IntegerOutOfRange {
        /// Integer received on the wire.
        value: i64,
        /// Local type name.
        target: &'static str,
    },

    /// A message is structurally invalid.
    #[error("malformed message: {message}")]
    MalformedMessage {
        /// Description of the problem.
        message: String,
    },

    /// A root is already registered under this name.
    #[error("root {name:?} is already registered")]
    DuplicateRoot {
        /// The root name.
        name: String,
    },

    /// An update named a root that is not registered.
    #[error("no root registered under {name:?}")]
    UnknownRoot {
        /// The root name.
        name: String,
    },

    /// An encoded message exceeds the configured size limit.
    #[error("message of {size} bytes exceeds limit of {limit} bytes")]
    MessageTooLarge {
        /// Encoded size.
        size: usize,
        /// Configured limit.
        limit: usize,
    },
}

impl MirrorError {
    /// Create a type mismatch error for the given value.
    pub fn type_mismatch(expected: &'static str, found: &Value) -> Self {
        Self::TypeMismatch {
            expected,
            found: found.kind(),
        }
    }

    /// Create a malformed message error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedMessage {
            message: message.into(),
        }
    }

    /// Returns true if this error means the two sides run different schemas
    /// or registries.
    pub fn is_version_skew(&self) -> bool {
        matches!(
            self,
            MirrorError::UnknownEnumValue { .. }
                | MirrorError::UnregisteredType { .. }
                | MirrorError::TypeMismatch { .. }
        )
    }

    /// Returns true if this error means the receiver lost its baseline and
    /// needs a full snapshot.
    pub fn is_desync(&self) -> bool {
        matches!(self, MirrorError::Desync { .. })
    }
}
