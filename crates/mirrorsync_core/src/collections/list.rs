//! Growable replicated sequence.

use super::Slots;
use crate::error::MirrorResult;
use crate::node::{Baseline, Mirrored};
use mirrorsync_codec::Value;
use std::fmt;
use std::ops::Index;

/// An ordered, growable sequence of replicated elements.
///
/// Replacing or editing an element marks its slot, and the next dirty-only
/// write carries just the marked slots:
/// `{"indices": [i, ...], "values": [v, ...]}`. Any edit that changes the
/// length or shifts elements (push, insert, remove, clear, ...) makes the
/// next write a full one: `{"size": n, "values": [...]}`.
///
/// ```
/// use mirrorsync_core::{Mirrored, MirroredList};
///
/// let mut list = MirroredList::from_vec(vec![1, 2, 3]);
/// list.set(1, 20);
/// let delta = list.write(true).unwrap();
/// assert_eq!(delta.get("indices").and_then(|v| v.as_array()).map(|a| a.len()), Some(1));
/// ```
pub struct MirroredList<T> {
    slots: Slots<T>,
}

impl<T: Mirrored + Clone> Clone for MirroredList<T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
        }
    }
}

impl<T> Default for MirroredList<T> {
    fn default() -> Self {
        Self {
            slots: Slots::default(),
        }
    }
}

impl<T> MirroredList<T> {
    /// An empty, clean list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when the list has no elements.
    pub fn is_empty(&self) -> bool {
        self.slots.len() == 0
    }

    /// Borrow an element.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.items().get(index)
    }

    /// Borrow all elements.
    pub fn as_slice(&self) -> &[T] {
        self.slots.items()
    }

    /// Iterate over the elements.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.slots.items().iter()
    }

    /// Append an element.
    pub fn push(&mut self, value: T) {
        self.slots.restructure(|items| items.push(value));
    }

    /// Insert an element, shifting later ones.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: T) {
        self.slots.restructure(|items| items.insert(index, value));
    }

    /// Remove and return the element at `index`, shifting later ones.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove(&mut self, index: usize) -> T {
        self.slots.restructure(|items| items.remove(index))
    }

    /// Remove the first element whose content equals `value`.
    ///
    /// Returns false, and records nothing, when no element matches.
    pub fn remove_item(&mut self, value: &T) -> bool
    where
        T: Mirrored,
    {
        match self.iter().position(|item| item.content_equals(value)) {
            Some(index) => {
                self.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove and return the last element.
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        self.slots.restructure(Vec::pop)
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        if !self.is_empty() {
            self.slots.restructure(Vec::clear);
        }
    }

    /// Shorten to `len` elements. No effect when already shorter.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len() {
            self.slots.restructure(|items| items.truncate(len));
        }
    }

    /// Replace the whole contents.
    pub fn set_all(&mut self, items: Vec<T>) {
        self.slots.restructure(|current| *current = items);
    }
}

impl<T: Mirrored> MirroredList<T> {
    /// A clean list holding `items`.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            slots: Slots::new(items),
        }
    }

    /// Replace the element at `index`, marking the slot if the content
    /// changed.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn set(&mut self, index: usize, value: T) {
        self.slots.set(index, value);
    }

    /// Mutable access to one element.
    ///
    /// A leaf element's slot is marked on access. Changes inside a node
    /// element are found when the list is checked, and a node assigned
    /// through the borrow is written in full.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index)
    }
}

impl<T: Mirrored + Default> Mirrored for MirroredList<T> {
    fn write(&self, dirty_only: bool) -> MirrorResult<Value> {
        self.slots.write(dirty_only)
    }

    fn read(&mut self, message: &Value) -> MirrorResult<()> {
        self.slots.read(message)
    }

    fn is_dirty(&self) -> bool {
        self.slots.is_dirty()
    }

    fn mark_clean(&mut self) {
        self.slots.mark_clean();
    }

    fn content_equals(&self, other: &Self) -> bool {
        self.slots.content_equals(&other.slots)
    }

    fn baseline(&self) -> Option<Baseline> {
        Some(self.slots.baseline())
    }

    fn describe(&self, out: &mut String, indent: usize) {
        self.slots.describe("list", out, indent);
    }
}

impl<T> Index<usize> for MirroredList<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.slots.items()[index]
    }
}

impl<T: Mirrored> From<Vec<T>> for MirroredList<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T: Mirrored> FromIterator<T> for MirroredList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a MirroredList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for MirroredList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
