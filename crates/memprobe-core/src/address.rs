//! Address ranges over a process's memory.
//!
//! An [`AddressRange`] is the unit the rest of the core reasons about: every
//! hypothesis asserts that *this range* holds an object of *some type*.
//! Equality is structural; ranges additionally support intersection queries
//! for the (currently unimplemented) conflict subgraph, see [`crate::conflict`].

use serde::{Deserialize, Serialize};

/// A contiguous span of process memory, identified by its start address and
/// size in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressRange {
    /// First byte of the range.
    pub start: u64,
    /// Number of bytes in the range.
    pub size: u64,
}

impl AddressRange {
    /// Creates a new address range.
    pub fn new(start: u64, size: u64) -> Self {
        AddressRange { start, size }
    }

    /// The address one past the last byte of this range.
    pub fn end(&self) -> u64 {
        self.start + self.size
    }

    /// Returns `true` if `self` and `other` share at least one byte.
    pub fn intersects(&self, other: &AddressRange) -> bool {
        self.start < other.end() && other.start < self.end()
    }

    /// Returns the sub-range for the `index`-th element of an array of
    /// `element_size`-byte elements starting at `self.start`.
    ///
    /// Does not check that `index` is in bounds; callers already know the
    /// element count from `self.size / element_size`.
    pub fn array_element(&self, index: u64, element_size: u64) -> AddressRange {
        AddressRange {
            start: self.start + index * element_size,
            size: element_size,
        }
    }

    /// Returns the sub-range for a field at byte `offset` with `size` bytes,
    /// relative to `self.start`.
    pub fn field(&self, offset: u64, size: u64) -> AddressRange {
        AddressRange {
            start: self.start + offset,
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_is_start_plus_size() {
        let range = AddressRange::new(0x1000, 8);
        assert_eq!(range.end(), 0x1008);
    }

    #[test]
    fn disjoint_ranges_do_not_intersect() {
        let a = AddressRange::new(0x1000, 4);
        let b = AddressRange::new(0x1004, 4);
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
    }

    #[test]
    fn overlapping_ranges_intersect() {
        let a = AddressRange::new(0x1000, 8);
        let b = AddressRange::new(0x1004, 8);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn nested_range_intersects_container() {
        let outer = AddressRange::new(0x1000, 16);
        let inner = outer.array_element(1, 4);
        assert_eq!(inner, AddressRange::new(0x1004, 4));
        assert!(outer.intersects(&inner));
    }

    #[test]
    fn field_offset_is_relative_to_start() {
        let parent = AddressRange::new(0x2000, 12);
        let field = parent.field(4, 4);
        assert_eq!(field, AddressRange::new(0x2004, 4));
    }
}
