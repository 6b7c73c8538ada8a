//! Replicated collections.
//!
//! Lists and arrays share one engine: a vector of child nodes, one dirty
//! marker per slot and a structural flag. The flag is raised by any change
//! in length or element order, and a raised flag turns the next dirty-only
//! write into a full one. Each slot also remembers its element's
//! [`Baseline`], so an element swapped out through `get_mut` is written in
//! full. Maps have their own engine in [`map`].

pub mod array;
pub mod list;
pub mod map;

use crate::dirty::DirtyBits;
use crate::error::{MirrorError, MirrorResult};
use crate::node::{apply_child, follow, newline, write_child, Baseline, Mirrored};
use crate::wire::{expect_index, full_payload, index_value, sparse_payload, CollectionPayload};
use mirrorsync_codec::Value;

/// Elements plus their dirty markers.
pub(crate) struct Slots<T> {
    items: Vec<T>,
    marks: DirtyBits,
    structural: bool,
    baseline: Baseline,
    recorded: Vec<Option<Baseline>>,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            marks: DirtyBits::new(0),
            structural: false,
            baseline: Baseline::fresh(),
            recorded: Vec::new(),
        }
    }
}

impl<T: Mirrored + Clone> Clone for Slots<T> {
    fn clone(&self) -> Self {
        let mut copy = Self::new(self.items.clone());
        copy.structural = self.structural;
        copy.marks = self.marks.clone();
        for index in 0..self.items.len() {
            if self.is_replaced(index) {
                copy.marks.set(index);
            }
        }
        copy
    }
}

impl<T> Slots<T> {
    pub(crate) fn items(&self) -> &[T] {
        &self.items
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn baseline(&self) -> Baseline {
        self.baseline
    }

    /// Run a length- or order-changing edit and record it.
    pub(crate) fn restructure<R>(&mut self, edit: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let out = edit(&mut self.items);
        self.structural = true;
        self.marks.resize(self.items.len());
        out
    }
}

impl<T: Mirrored> Slots<T> {
    pub(crate) fn new(items: Vec<T>) -> Self {
        let marks = DirtyBits::new(items.len());
        let recorded = items.iter().map(Mirrored::baseline).collect();
        Self {
            items,
            marks,
            structural: false,
            baseline: Baseline::fresh(),
            recorded,
        }
    }

    /// True when the slot must be written in full: marked, or holding a
    /// different node than at the last clean point.
    fn is_replaced(&self, index: usize) -> bool {
        self.marks.bit(index)
            || self.items.get(index).is_some_and(|item| {
                item.baseline() != self.recorded.get(index).copied().flatten()
            })
    }

    /// Replace the element at `index` if the content differs.
    pub(crate) fn set(&mut self, index: usize, value: T) {
        let len = self.items.len();
        let Some(slot) = self.items.get_mut(index) else {
            panic!("index {index} out of bounds for length {len}");
        };
        if !slot.content_equals(&value) {
            *slot = value;
            self.marks.set(index);
        }
    }

    /// Mutable access to one element. Slots whose element keeps no
    /// markers of its own are marked on access.
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let item = self.items.get_mut(index)?;
        if item.baseline().is_none() {
            self.marks.set(index);
        }
        Some(item)
    }

    pub(crate) fn write(&self, dirty_only: bool) -> MirrorResult<Value> {
        if !dirty_only || self.structural {
            let values = self
                .items
                .iter()
                .map(|item| write_child(item, false))
                .collect::<MirrorResult<Vec<_>>>()?;
            return Ok(full_payload(values));
        }

        let mut indices = Vec::new();
        let mut values = Vec::new();
        for (index, item) in self.items.iter().enumerate() {
            let value = if self.is_replaced(index) {
                write_child(item, false)?
            } else if item.is_dirty() {
                write_child(item, true)?
            } else {
                continue;
            };
            indices.push(index_value(index));
            values.push(value);
        }
        Ok(sparse_payload(indices, values))
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.structural
            || !self.marks.is_clear()
            || (0..self.items.len()).any(|index| self.is_replaced(index))
            || self.items.iter().any(Mirrored::is_dirty)
    }

    pub(crate) fn mark_clean(&mut self) {
        self.structural = false;
        self.marks.clear();
        for item in &mut self.items {
            item.mark_clean();
        }
        self.recorded = self.items.iter().map(Mirrored::baseline).collect();
    }

    pub(crate) fn content_equals(&self, other: &Self) -> bool {
        self.items.len() == other.items.len()
            && self
                .items
                .iter()
                .zip(&other.items)
                .all(|(a, b)| a.content_equals(b))
    }

    pub(crate) fn describe(&self, name: &str, out: &mut String, indent: usize) {
        out.push_str(name);
        out.push('[');
        out.push_str(&self.items.len().to_string());
        out.push(']');
        if self.structural {
            out.push('*');
        }
        out.push_str(" [");
        for (index, item) in self.items.iter().enumerate() {
            newline(out, indent + 1);
            out.push_str(&index.to_string());
            if self.is_replaced(index) || item.is_dirty() {
                out.push('*');
            }
            out.push_str(": ");
            item.describe(out, indent + 1);
        }
        newline(out, indent);
        out.push(']');
    }
}

impl<T: Mirrored + Default> Slots<T> {
    /// Apply a sparse or full collection payload.
    ///
    /// A sparse payload may only address existing slots. A full payload
    /// updates existing slots in place, appends new ones and drops the tail
    /// beyond its size.
    pub(crate) fn read(&mut self, message: &Value) -> MirrorResult<()> {
        match CollectionPayload::parse(message)? {
            CollectionPayload::Sparse { indices, values } => {
                for (index, value) in indices.iter().zip(values) {
                    let index = expect_index(index)?;
                    let len = self.items.len();
                    let slot = self
                        .items
                        .get_mut(index)
                        .ok_or(MirrorError::Desync { index, len })?;
                    let before = slot.baseline();
                    apply_child(slot, value)?;
                    if let Some(recorded) = self.recorded.get_mut(index) {
                        follow(recorded, before, slot.baseline());
                    }
                }
            }
            CollectionPayload::Full { size, keys, values } => {
                if keys.is_some() {
                    return Err(MirrorError::malformed("keyed payload for a sequence"));
                }
                let known = self.items.len();
                for (index, value) in values.iter().enumerate() {
                    match self.items.get_mut(index) {
                        Some(slot) => {
                            let before = slot.baseline();
                            apply_child(slot, value)?;
                            if let Some(recorded) = self.recorded.get_mut(index) {
                                follow(recorded, before, slot.baseline());
                            }
                        }
                        None => {
                            let mut fresh = T::default();
                            fresh.reset_from(value)?;
                            self.items.push(fresh);
                        }
                    }
                }
                self.recorded.resize(known, None);
                self.recorded
                    .extend(self.items[known..].iter().map(Mirrored::baseline));
                if let Some(size) = size {
                    self.items.truncate(size);
                    self.recorded.truncate(size);
                }
                self.marks.resize(self.items.len());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_read_grows_and_shrinks() {
        let mut slots = Slots::new(vec![1i32, 2, 3]);
        slots
            .read(&full_payload(vec![Value::Integer(9), Value::Integer(8)]))
            .unwrap();
        assert_eq!(slots.items(), &[9, 8]);

        slots
            .read(&full_payload(vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3),
                Value::Integer(4),
            ]))
            .unwrap();
        assert_eq!(slots.items(), &[1, 2, 3, 4]);
        assert!(!slots.is_dirty());
    }

    #[test]
    fn sparse_read_past_end_is_desync() {
        let mut slots = Slots::new(vec![1i32, 2]);
        let msg = sparse_payload(vec![Value::Integer(4)], vec![Value::Integer(0)]);
        assert_eq!(slots.read(&msg), Err(MirrorError::Desync { index: 4, len: 2 }));
    }

    #[test]
    fn keyed_payload_is_rejected() {
        let mut slots = Slots::new(vec![1i32]);
        let msg = Value::object([
            ("keys", Value::Array(vec![Value::from("a")])),
            ("values", Value::Array(vec![Value::Integer(1)])),
        ]);
        assert!(matches!(
            slots.read(&msg),
            Err(MirrorError::MalformedMessage { .. })
        ));
    }

    crate::mirrored_composite! {
        struct Cell: Complex {
            a: i32 => set_a, a_mut;
            b: i32 => set_b, b_mut;
        }
    }

    fn cell(a: i32, b: i32) -> Cell {
        let mut c = Cell::new();
        c.set_a(a);
        c.set_b(b);
        c
    }

    #[test]
    fn swapped_element_is_written_whole() {
        let mut slots = Slots::new(vec![cell(1, 2), cell(3, 4)]);
        slots.mark_clean();
        assert!(!slots.is_dirty());

        let mut fresh = Cell::new();
        fresh.set_a(9);
        if let Some(slot) = slots.get_mut(1) {
            *slot = fresh;
        }
        assert!(slots.is_dirty());
        let msg = slots.write(true).unwrap();
        assert_eq!(
            msg,
            sparse_payload(
                vec![Value::Integer(1)],
                vec![Value::object([("a", Value::Integer(9)), ("b", Value::Integer(0))])]
            )
        );

        let mut receiver = Slots::new(vec![cell(1, 2), cell(3, 4)]);
        receiver.mark_clean();
        receiver.read(&msg).unwrap();
        assert!(receiver.content_equals(&slots));
        assert!(!receiver.is_dirty());
    }

    #[test]
    fn edit_in_place_stays_minimal() {
        let mut slots = Slots::new(vec![cell(1, 2)]);
        slots.mark_clean();
        if let Some(slot) = slots.get_mut(0) {
            slot.set_b(5);
        }
        assert_eq!(
            slots.write(true).unwrap(),
            sparse_payload(
                vec![Value::Integer(0)],
                vec![Value::object([("b", Value::Integer(5))])]
            )
        );
    }

    #[test]
    fn clone_keeps_pending_swaps() {
        let mut slots = Slots::new(vec![cell(1, 2)]);
        slots.mark_clean();
        if let Some(slot) = slots.get_mut(0) {
            *slot = cell(1, 7);
        }
        let copy = slots.clone();
        assert!(copy.is_dirty());
        assert_eq!(copy.write(true).unwrap(), slots.write(true).unwrap());

        slots.mark_clean();
        assert!(!slots.clone().is_dirty());
    }

    #[test]
    fn full_read_keeps_receiver_clean() {
        let sender = Slots::new(vec![cell(1, 2), cell(3, 4), cell(5, 6)]);
        let mut receiver = Slots::new(vec![cell(0, 0)]);
        receiver.read(&sender.write(false).unwrap()).unwrap();
        assert!(receiver.content_equals(&sender));
        assert!(!receiver.is_dirty());
    }

    #[test]
    fn restructure_forces_full_write() {
        let mut slots = Slots::new(vec![1i32]);
        slots.restructure(|items| items.push(2));
        assert!(slots.structural);
        assert_eq!(slots.write(true).unwrap(), slots.write(false).unwrap());
        slots.mark_clean();
        assert!(!slots.is_dirty());
    }
}
