//! Fixed-length replicated sequence.

use super::Slots;
use crate::error::MirrorResult;
use crate::node::{Baseline, Mirrored};
use mirrorsync_codec::Value;
use std::fmt;
use std::ops::Index;

/// A sequence whose length only changes through [`MirroredArray::resize`].
///
/// Shares the list's wire format. Since slots are never inserted or
/// removed, edits stay sparse until the array is resized.
pub struct MirroredArray<T> {
    slots: Slots<T>,
}

impl<T: Mirrored + Clone> Clone for MirroredArray<T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
        }
    }
}

impl<T> Default for MirroredArray<T> {
    fn default() -> Self {
        Self {
            slots: Slots::default(),
        }
    }
}

impl<T> MirroredArray<T> {
    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when the array has no slots.
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
}

impl<T: Mirrored + Default> MirroredArray<T> {
    /// A clean array of `len` default elements.
    pub fn with_len(len: usize) -> Self {
        Self::from_vec(std::iter::repeat_with(T::default).take(len).collect())
    }

    /// Change the number of slots, filling new ones with defaults.
    pub fn resize(&mut self, len: usize) {
        if len != self.len() {
            self.slots
                .restructure(|items| items.resize_with(len, T::default));
        }
    }
}

impl<T: Mirrored> MirroredArray<T> {
    /// A clean array holding `items`.
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

    /// Mutable access to one element. Leaf slots are marked on access, and
    /// a node assigned through the borrow is written in full.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index)
    }

    /// Set every slot to a copy of `value`. Only differing slots are marked.
    pub fn fill(&mut self, value: &T)
    where
        T: Clone,
    {
        for index in 0..self.len() {
            self.slots.set(index, value.clone());
        }
    }
}

impl<T: Mirrored + Default> Mirrored for MirroredArray<T> {
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
        self.slots.describe("array", out, indent);
    }
}

impl<T> Index<usize> for MirroredArray<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.slots.items()[index]
    }
}

impl<T: Mirrored> From<Vec<T>> for MirroredArray<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T: fmt::Debug> fmt::Debug for MirroredArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{full_payload, sparse_payload};

    #[test]
    fn edits_stay_sparse() {
        let mut grid = MirroredArray::<u8>::with_len(4);
        assert!(!grid.is_dirty());
        grid.set(3, 1);
        grid.set(1, 1);
        assert_eq!(
            grid.write(true).unwrap(),
            sparse_payload(
                vec![Value::Integer(1), Value::Integer(3)],
                vec![Value::Integer(1), Value::Integer(1)]
            )
        );
    }

    #[test]
    fn fill_marks_only_changed_slots() {
        let mut grid = MirroredArray::from_vec(vec![0u8, 5, 0]);
        grid.fill(&5);
        assert_eq!(
            grid.write(true).unwrap(),
            sparse_payload(
                vec![Value::Integer(0), Value::Integer(2)],
                vec![Value::Integer(5), Value::Integer(5)]
            )
        );
    }

    #[test]
    fn resize_is_structural() {
        let mut sender = MirroredArray::<i32>::with_len(2);
        let mut receiver = MirroredArray::<i32>::with_len(2);
        sender.resize(2);
        assert!(!sender.is_dirty());

        sender.resize(3);
        let msg = sender.write(true).unwrap();
        assert_eq!(
            msg,
            full_payload(vec![Value::Integer(0), Value::Integer(0), Value::Integer(0)])
        );
        receiver.read(&msg).unwrap();
        assert_eq!(receiver.len(), 3);
    }
}
