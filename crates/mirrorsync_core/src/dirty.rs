//! Dirty markers: the per-type policy and the field bitset behind it.

use std::fmt;

/// How a composite type tracks which of its own fields changed.
///
/// Chosen once per declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirtyPolicy {
    /// No tracking. Never reports dirty and always writes every field.
    /// Suited to small values that are cheaper to resend than to track.
    Never,
    /// One flag for the whole record. A dirty-only write sends nothing or
    /// every field.
    Any,
    /// One bit per field. A dirty-only write sends exactly the changed
    /// fields.
    Complex,
}

impl DirtyPolicy {
    /// Short lowercase name, used by `describe`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DirtyPolicy::Never => "never",
            DirtyPolicy::Any => "any",
            DirtyPolicy::Complex => "complex",
        }
    }
}

/// A fixed-size bitset, one bit per tracked slot.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct DirtyBits {
    mask: Vec<u8>,
    len: usize,
}

impl DirtyBits {
    /// A clear bitset able to hold `len` bits.
    pub fn new(len: usize) -> Self {
        Self {
            mask: vec![0; len.div_ceil(8)],
            len,
        }
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the bitset holds no bits at all.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read one bit. Out-of-range bits read as clear.
    pub fn bit(&self, index: usize) -> bool {
        index < self.len && self.mask[index / 8] & (1 << (index % 8)) != 0
    }

    /// Set one bit. Out-of-range indices are ignored.
    pub fn set(&mut self, index: usize) {
        if index < self.len {
            self.mask[index / 8] |= 1 << (index % 8);
        }
    }

    /// Set every bit.
    pub fn set_all(&mut self) {
        for byte in &mut self.mask {
            *byte = u8::MAX;
        }
        self.trim_tail();
    }

    /// Clear every bit.
    pub fn clear(&mut self) {
        for byte in &mut self.mask {
            *byte = 0;
        }
    }

    /// True when no bit is set.
    pub fn is_clear(&self) -> bool {
        self.mask.iter().all(|byte| *byte == 0)
    }

    /// Indices of set bits, ascending.
    pub fn iter_set(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |i| self.bit(*i))
    }

    /// Grow or shrink to `len` bits. New bits start clear.
    pub fn resize(&mut self, len: usize) {
        self.mask.resize(len.div_ceil(8), 0);
        self.len = len;
        self.trim_tail();
    }

    fn trim_tail(&mut self) {
        let used = self.len % 8;
        if used != 0 {
            if let Some(last) = self.mask.last_mut() {
                *last &= (1u8 << used) - 1;
            }
        }
    }
}

impl fmt::Debug for DirtyBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.len {
            f.write_str(if self.bit(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn set_and_clear() {
        let mut bits = DirtyBits::new(10);
        assert!(bits.is_clear());
        bits.set(0);
        bits.set(9);
        bits.set(42);
        assert!(bits.bit(0));
        assert!(bits.bit(9));
        assert!(!bits.bit(42));
        assert_eq!(bits.iter_set().collect::<Vec<_>>(), vec![0, 9]);
        bits.clear();
        assert!(bits.is_clear());
    }

    #[test]
    fn set_all_respects_length() {
        let mut bits = DirtyBits::new(3);
        bits.set_all();
        assert_eq!(bits.iter_set().count(), 3);
        bits.resize(5);
        assert_eq!(format!("{bits:?}"), "11100");
    }

    proptest! {
        #[test]
        fn set_bits_are_reported(len in 0usize..200, picks in prop::collection::vec(0usize..256, 0..32)) {
            let mut bits = DirtyBits::new(len);
            for pick in &picks {
                bits.set(*pick);
            }
            let mut expected: Vec<usize> = picks.iter().copied().filter(|p| *p < len).collect();
            expected.sort_unstable();
            expected.dedup();
            prop_assert_eq!(bits.iter_set().collect::<Vec<_>>(), expected);
        }
    }

    #[test]
    fn empty_bitset() {
        let bits = DirtyBits::new(0);
        assert!(bits.is_empty());
        assert!(bits.is_clear());
    }
}
