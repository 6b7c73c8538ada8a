//! The contract every replicated node implements.

use crate::error::MirrorResult;
use mirrorsync_codec::Value;
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of the state a node's dirty markers are measured against.
///
/// Every new or cloned tracking node gets a baseline no other node has, and
/// keeps it while it is edited in place. A parent remembers each child's
/// baseline at its last clean point; a different baseline in the same slot
/// means the child was swapped out through a mutable borrow, and the slot
/// is written in full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Baseline(u64);

impl Baseline {
    /// A baseline not shared with any other node.
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A node participating in replication.
///
/// A node writes its state into a message [`Value`] and applies incoming
/// messages onto itself. Between synchronization ticks it tracks which of
/// its parts changed so that `write(true)` can send only those.
///
/// Dirtiness is derived, not cached: `is_dirty` on a composite or a
/// collection checks its own markers and then asks each owned child.
/// Mutating a nested node in place (through a `*_mut` accessor) is therefore
/// visible to every ancestor on the next query, and no query ever changes
/// state.
///
/// Replacing a child wholesale through a mutable borrow is caught by its
/// [`Baseline`]. Children without one ([`Mirrored::baseline`] is `None`)
/// are marked by their parent on every mutable access instead.
///
/// The trait is object safe; [`Mirrored::content_equals`] is only available
/// on sized types.
pub trait Mirrored {
    /// Write this node.
    ///
    /// With `dirty_only` the message carries only what changed since the
    /// last [`Mirrored::mark_clean`]; otherwise it carries the full state.
    fn write(&self, dirty_only: bool) -> MirrorResult<Value>;

    /// Apply a message produced by [`Mirrored::write`] on the other side.
    ///
    /// Applying a message never marks the receiver dirty.
    fn read(&mut self, message: &Value) -> MirrorResult<()>;

    /// True when something changed since the last clean point.
    ///
    /// Conservative: `false` guarantees no observable change.
    fn is_dirty(&self) -> bool;

    /// Reset all dirty markers, recursively. Idempotent.
    fn mark_clean(&mut self);

    /// Deep value equality, independent of identity and dirty state.
    fn content_equals(&self, other: &Self) -> bool
    where
        Self: Sized;

    /// Append a human-readable dump of this node to `out`.
    fn describe(&self, out: &mut String, indent: usize);

    /// True for scalar and enum values, which never track changes
    /// themselves; containers mark their slot instead.
    fn is_leaf(&self) -> bool {
        false
    }

    /// The baseline this node's markers are relative to.
    ///
    /// `None` for nodes that keep no markers of their own (leaves, `Never`
    /// records, empty options); a parent marks those on mutable access.
    fn baseline(&self) -> Option<Baseline> {
        None
    }

    /// False for nodes whose [`Mirrored::read`] is a no-op.
    ///
    /// Such nodes can still change locally. A parent replaces them as a
    /// whole instead of updating them in place.
    fn is_mutable(&self) -> bool {
        true
    }

    /// Replace this node's state with a full message, as if a new value had
    /// been assigned at the parent. Ignores [`Mirrored::is_mutable`].
    fn reset_from(&mut self, message: &Value) -> MirrorResult<()> {
        self.read(message)
    }
}

/// Write a child node on behalf of its parent.
///
/// Immutable children are always written in full, since the receiving
/// parent replaces them rather than patching them.
pub fn write_child<M: Mirrored + ?Sized>(child: &M, dirty_only: bool) -> MirrorResult<Value> {
    child.write(dirty_only && child.is_mutable())
}

/// Apply a message to a child node on behalf of its parent.
pub fn apply_child<M: Mirrored + ?Sized>(child: &mut M, message: &Value) -> MirrorResult<()> {
    if child.is_mutable() {
        child.read(message)
    } else {
        child.reset_from(message)
    }
}

/// Keep a parent's record of a child in step with a read that swapped the
/// child's baseline. A record that was already stale stays stale, so a
/// pending local replacement is still sent.
pub(crate) fn follow(recorded: &mut Option<Baseline>, before: Option<Baseline>, after: Option<Baseline>) {
    if before != after && *recorded == before {
        *recorded = after;
    }
}

/// A [`Mirrored`] node that can be stored type-erased and recovered by type.
pub trait AnyMirrored: Mirrored + Any {
    /// Upcast for downcasting by reference.
    fn as_any(&self) -> &dyn Any;

    /// Upcast for downcasting by mutable reference.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Rust type name, for diagnostics.
    fn type_name(&self) -> &'static str;
}

impl<T: Mirrored + Any> AnyMirrored for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Render a node's `describe` output into a fresh string.
pub fn describe_to_string<M: Mirrored + ?Sized>(node: &M) -> String {
    let mut out = String::new();
    node.describe(&mut out, 0);
    out
}

/// Start a new line at the given depth.
pub(crate) fn newline(out: &mut String, indent: usize) {
    out.push('\n');
    for _ in 0..indent {
        out.push_str("  ");
    }
}
