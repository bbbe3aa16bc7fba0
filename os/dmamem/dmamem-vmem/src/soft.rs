//! # Software Address Space
//!
//! A per-caller page table kept in a `BTreeMap` (virtual page number → leaf
//! entry), backed by a shared [`PhysicalMemory`]. It behaves like the real
//! thing where the mapping handler can tell the difference:
//!
//! - installation is all-or-nothing and refuses overlaps,
//! - loads and stores translate through the installed entries,
//! - an address space can be sealed so that new mappings are denied.

use crate::address_space::{MMAP_BASE, USERSPACE_END};
use crate::{PageEntryBits, PhysicalMemory, RemapError, UserAddressSpace, UserFault};
use alloc::collections::BTreeMap;
use dmamem_addresses::{
    PageSize, PhysicalAddress, PhysicalFrame, Size4K, VirtualAddress, align_up, pages_for,
};
use log::trace;

pub struct SoftAddressSpace<'m, M: PhysicalMemory> {
    memory: &'m M,
    entries: BTreeMap<u64, PageEntryBits>,
    sealed: bool,
}

impl<'m, M: PhysicalMemory> SoftAddressSpace<'m, M> {
    #[must_use]
    pub const fn new(memory: &'m M) -> Self {
        Self {
            memory,
            entries: BTreeMap::new(),
            sealed: false,
        }
    }

    /// Refuse all further mappings with [`RemapError::PermissionDenied`].
    pub const fn seal(&mut self) {
        self.sealed = true;
    }

    /// Number of installed 4 KiB leaves.
    #[must_use]
    pub fn mapped_pages(&self) -> usize {
        self.entries.len()
    }

    /// The leaf entry covering `va`, if any.
    #[must_use]
    pub fn entry(&self, va: VirtualAddress) -> Option<PageEntryBits> {
        self.entries.get(&va.page::<Size4K>().number()).copied()
    }

    /// Translate `va` to the physical address it maps to.
    #[must_use]
    pub fn translate(&self, va: VirtualAddress) -> Option<PhysicalAddress> {
        let e = self.entry(va)?;
        Some(e.frame().base() + va.offset::<Size4K>())
    }

    /// Remove the mappings covering `len` bytes at `start`.
    pub fn unmap(&mut self, start: VirtualAddress, len: u64) {
        let first = start.page::<Size4K>().number();
        for vpn in first..first + pages_for::<Size4K>(len) {
            self.entries.remove(&vpn);
        }
    }

    /// Load `buf.len()` bytes from `va` through the page tables.
    ///
    /// # Errors
    /// [`UserFault`] at the first unmapped byte.
    pub fn read(&self, va: VirtualAddress, buf: &mut [u8]) -> Result<(), UserFault> {
        self.walk(va, buf.len(), false, |pa, range| {
            self.memory.read(pa, &mut buf[range]);
        })
    }

    /// Store `bytes` at `va` through the page tables.
    ///
    /// # Errors
    /// [`UserFault`] at the first unmapped or read-only byte.
    pub fn write(&self, va: VirtualAddress, bytes: &[u8]) -> Result<(), UserFault> {
        self.walk(va, bytes.len(), true, |pa, range| {
            self.memory.write(pa, &bytes[range]);
        })
    }

    /// Check every page first, then visit `(pa, buffer range)` per page chunk.
    fn walk(
        &self,
        va: VirtualAddress,
        len: usize,
        store: bool,
        mut f: impl FnMut(PhysicalAddress, core::ops::Range<usize>),
    ) -> Result<(), UserFault> {
        let mut chunks = alloc::vec::Vec::new();
        let mut done = 0usize;
        while done < len {
            let at = va.checked_add(done as u64).ok_or(UserFault(va))?;
            let e = self.entry(at).ok_or(UserFault(at))?;
            if !e.present() || !e.user_access() || (store && !e.writable()) {
                return Err(UserFault(at));
            }
            #[allow(clippy::cast_possible_truncation)]
            let room = (Size4K::SIZE - at.offset::<Size4K>()) as usize;
            let n = room.min(len - done);
            chunks.push((e.frame().base() + at.offset::<Size4K>(), done..done + n));
            done += n;
        }
        for (pa, range) in chunks {
            f(pa, range);
        }
        Ok(())
    }

    fn overlaps(&self, first: u64, pages: u64) -> Option<u64> {
        self.entries
            .range(first..first + pages)
            .next_back()
            .map(|(vpn, _)| *vpn)
    }
}

impl<M: PhysicalMemory> UserAddressSpace for SoftAddressSpace<'_, M> {
    fn get_unmapped_area(&self, len: u64) -> Option<VirtualAddress> {
        let pages = pages_for::<Size4K>(align_up(len, Size4K::SIZE)?).max(1);
        let mut first = MMAP_BASE >> Size4K::SHIFT;
        let last = USERSPACE_END >> Size4K::SHIFT;
        while first + pages <= last {
            match self.overlaps(first, pages) {
                None => return Some(VirtualAddress::new(first << Size4K::SHIFT)),
                Some(taken) => first = taken + 1,
            }
        }
        None
    }

    fn remap_pfn_range(
        &mut self,
        start: VirtualAddress,
        frame: PhysicalFrame<Size4K>,
        len: u64,
        flags: PageEntryBits,
    ) -> Result<(), RemapError> {
        if self.sealed {
            return Err(RemapError::PermissionDenied);
        }
        if !start.is_aligned::<Size4K>() {
            return Err(RemapError::Unaligned(start));
        }

        let len = align_up(len, Size4K::SIZE).ok_or(RemapError::OutOfRange)?;
        let end = start.checked_add(len).ok_or(RemapError::OutOfRange)?;
        if end.as_u64() > USERSPACE_END {
            return Err(RemapError::OutOfRange);
        }

        let first = start.page::<Size4K>().number();
        let pages = pages_for::<Size4K>(len);
        if let Some(vpn) = self.overlaps(first, pages) {
            return Err(RemapError::Overlap(VirtualAddress::new(vpn << Size4K::SHIFT)));
        }

        for i in 0..pages {
            self.entries
                .insert(first + i, flags.with_frame(frame.forward(i)));
        }
        trace!(
            "remapped {pages} pages at {start} -> pfn {:#x}",
            frame.number()
        );
        Ok(())
    }

    fn copy_to_user(&self, dst: VirtualAddress, src: &[u8]) -> Result<(), UserFault> {
        self.write(dst, src)
    }
}
