//! Replicated keyed collection.

use crate::error::{MirrorError, MirrorResult};
use crate::leaf::Leaf;
use crate::node::{apply_child, newline, write_child, Baseline, Mirrored};
use crate::wire::{index_value, sparse_payload, CollectionPayload, KEYS, SIZE, VALUES};
use indexmap::{Equivalent, IndexMap};
use mirrorsync_codec::Value;
use std::fmt;
use std::hash::Hash;

/// A keyed collection of replicated values, in insertion order.
///
/// Maps have no per-entry markers: whenever anything in the map changed,
/// the next dirty-only write is a full rewrite,
/// `{"size": n, "keys": [...], "values": [...]}`. A clean map writes an
/// empty sparse payload.
///
/// Receivers also accept a keyed sparse payload whose `indices` are keys;
/// missing keys are created.
pub struct MirroredMap<K, V> {
    entries: IndexMap<K, V>,
    structural: bool,
    touched: bool,
    baseline: Baseline,
}

impl<K, V> Default for MirroredMap<K, V> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            structural: false,
            touched: false,
            baseline: Baseline::fresh(),
        }
    }
}

impl<K: Clone, V: Clone> Clone for MirroredMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            structural: self.structural,
            touched: self.touched,
            baseline: Baseline::fresh(),
        }
    }
}

impl<K: Hash + Eq, V> MirroredMap<K, V> {
    /// An empty, clean map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Borrow the value under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.entries.get(key)
    }

    /// True when `key` is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.entries.contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, K, V> {
        self.entries.keys()
    }

    /// Values in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, K, V> {
        self.entries.values()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, K, V> {
        self.entries.iter()
    }

    /// Remove and return the value under `key`, keeping the order of the
    /// remaining entries.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let removed = self.entries.shift_remove(key);
        if removed.is_some() {
            self.structural = true;
        }
        removed
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.structural = true;
        }
    }
}

impl<K: Hash + Eq, V: Mirrored> MirroredMap<K, V> {
    /// Store `value` under `key` and return the value previously there.
    ///
    /// Storing a value equal to the current one is not a change.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(slot) = self.entries.get_mut(&key) {
            if slot.content_equals(&value) {
                return Some(value);
            }
            self.structural = true;
            return Some(std::mem::replace(slot, value));
        }
        self.entries.insert(key, value);
        self.structural = true;
        None
    }

    /// Mutable access to the value under `key`.
    ///
    /// The map counts as changed on access, whatever the value type: a
    /// changed map is rewritten in full either way.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let value = self.entries.get_mut(key)?;
        self.touched = true;
        Some(value)
    }
}

impl<K, V> Mirrored for MirroredMap<K, V>
where
    K: Leaf + Hash + Eq,
    V: Mirrored + Default,
{
    fn write(&self, dirty_only: bool) -> MirrorResult<Value> {
        if dirty_only && !self.is_dirty() {
            return Ok(sparse_payload(Vec::new(), Vec::new()));
        }
        let mut keys = Vec::with_capacity(self.entries.len());
        let mut values = Vec::with_capacity(self.entries.len());
        for (key, value) in &self.entries {
            keys.push(key.to_value());
            values.push(write_child(value, false)?);
        }
        Ok(Value::object([
            (SIZE, index_value(keys.len())),
            (KEYS, Value::Array(keys)),
            (VALUES, Value::Array(values)),
        ]))
    }

    fn read(&mut self, message: &Value) -> MirrorResult<()> {
        match CollectionPayload::parse(message)? {
            CollectionPayload::Sparse { indices, values } => {
                for (key, value) in indices.iter().zip(values) {
                    let key = K::from_value(key)?;
                    match self.entries.get_mut(&key) {
                        Some(slot) => apply_child(slot, value)?,
                        None => {
                            let mut fresh = V::default();
                            fresh.reset_from(value)?;
                            self.entries.insert(key, fresh);
                        }
                    }
                }
            }
            CollectionPayload::Full { keys, values, .. } => {
                let keys = keys.ok_or_else(|| MirrorError::malformed("map payload without keys"))?;
                let mut next = IndexMap::with_capacity(keys.len());
                for (key, value) in keys.iter().zip(values) {
                    let key = K::from_value(key)?;
                    let slot = match self.entries.swap_remove(&key) {
                        Some(mut existing) => {
                            apply_child(&mut existing, value)?;
                            existing
                        }
                        None => {
                            let mut fresh = V::default();
                            fresh.reset_from(value)?;
                            fresh
                        }
                    };
                    next.insert(key, slot);
                }
                self.entries = next;
            }
        }
        Ok(())
    }

    fn is_dirty(&self) -> bool {
        self.structural || self.touched || self.entries.values().any(Mirrored::is_dirty)
    }

    fn mark_clean(&mut self) {
        self.structural = false;
        self.touched = false;
        for value in self.entries.values_mut() {
            value.mark_clean();
        }
    }

    fn content_equals(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().all(|(key, value)| {
                other
                    .entries
                    .get(key)
                    .is_some_and(|theirs| value.content_equals(theirs))
            })
    }

    fn baseline(&self) -> Option<Baseline> {
        Some(self.baseline)
    }

    fn describe(&self, out: &mut String, indent: usize) {
        out.push_str("map[");
        out.push_str(&self.entries.len().to_string());
        out.push(']');
        if self.structural || self.touched {
            out.push('*');
        }
        out.push_str(" {");
        for (key, value) in &self.entries {
            newline(out, indent + 1);
            out.push_str(&key.to_value().to_string());
            out.push_str(": ");
            value.describe(out, indent + 1);
        }
        newline(out, indent);
        out.push('}');
    }
}

impl<K: Hash + Eq, V> FromIterator<(K, V)> for MirroredMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
            structural: false,
            touched: false,
            baseline: Baseline::fresh(),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a MirroredMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = indexmap::map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for MirroredMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}
