//! # Caller Address Spaces
//!
//! The seam between the mapping handler and whatever owns the caller's page
//! tables. A mapping request is a [`VmArea`] (where, how long) plus a mutable
//! borrow of the caller's [`UserAddressSpace`]; the handler never touches
//! any other address space.

use crate::PageEntryBits;
use dmamem_addresses::{PhysicalFrame, Size4K, VirtualAddress, align_up};

/// End of the user half of the address space (exclusive).
pub const USERSPACE_END: u64 = 0x0000_8000_0000_0000;

/// Where [`UserAddressSpace::get_unmapped_area`] implementations start looking.
pub const MMAP_BASE: u64 = 0x0000_7000_0000_0000;

/// A caller-side virtual range to be backed by physical memory.
///
/// Like a VMA, the length is always a whole number of 4 KiB pages.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VmArea {
    start: VirtualAddress,
    len: u64,
}

impl VmArea {
    /// Area of `len` bytes at `start`, rounded up to whole pages.
    ///
    /// Returns `None` if rounding overflows.
    #[must_use]
    pub const fn new(start: VirtualAddress, len: u64) -> Option<Self> {
        match align_up(len, 4096) {
            Some(len) => Some(Self { start, len }),
            None => None,
        }
    }

    #[must_use]
    pub const fn start(&self) -> VirtualAddress {
        self.start
    }

    /// Page-rounded length in bytes.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Exclusive end, or `None` if it would wrap.
    #[must_use]
    pub const fn end(&self) -> Option<VirtualAddress> {
        self.start.checked_add(self.len)
    }
}

/// Why installing a mapping failed. Nothing is installed in any of these cases.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum RemapError {
    #[error("mapping start {0} is not page aligned")]
    Unaligned(VirtualAddress),
    #[error("range at {0} overlaps an existing mapping")]
    Overlap(VirtualAddress),
    #[error("range does not fit in the user address space")]
    OutOfRange,
    #[error("address space does not permit new mappings")]
    PermissionDenied,
}

/// A load or store hit an unmapped or read-only user page.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("access fault at {0}")]
pub struct UserFault(pub VirtualAddress);

/// A caller's page tables, as far as the driver needs them.
pub trait UserAddressSpace {
    /// Pick a free, page-aligned range able to hold `len` bytes.
    fn get_unmapped_area(&self, len: u64) -> Option<VirtualAddress>;

    /// Linearly map `len` bytes (rounded up to pages) starting at `start`
    /// onto consecutive frames beginning at `frame`, with leaf `flags`.
    ///
    /// Installation is all-or-nothing.
    ///
    /// # Errors
    /// See [`RemapError`].
    fn remap_pfn_range(
        &mut self,
        start: VirtualAddress,
        frame: PhysicalFrame<Size4K>,
        len: u64,
        flags: PageEntryBits,
    ) -> Result<(), RemapError>;

    /// Copy `src` into caller memory at `dst`.
    ///
    /// # Errors
    /// [`UserFault`] if any byte of the destination is not writable; nothing
    /// is copied in that case.
    fn copy_to_user(&self, dst: VirtualAddress, src: &[u8]) -> Result<(), UserFault>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn areas_round_up_to_pages() {
        let a = VmArea::new(VirtualAddress::new(0x7000_0000_0000), 1).unwrap();
        assert_eq!(a.len(), 4096);
        assert_eq!(a.end(), Some(VirtualAddress::new(0x7000_0000_1000)));

        let b = VmArea::new(VirtualAddress::new(0x1000), 0x2000_0001).unwrap();
        assert_eq!(b.len(), 0x2000_1000);

        assert!(VmArea::new(VirtualAddress::zero(), 0).unwrap().is_empty());
        assert!(VmArea::new(VirtualAddress::zero(), u64::MAX).is_none());
    }
}
