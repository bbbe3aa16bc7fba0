use crate::CachePolicy;
use bitfield_struct::bitfield;
use dmamem_addresses::{PhysicalFrame, Size4K};

/// A 64-bit x86-64 **4 KiB leaf** page table entry.
///
/// User mappings of the reserved region are always installed as 4 KiB
/// leaves, so bit 7 is the PAT selector rather than the large-page flag.
///
/// ### Bit layout
///
/// | Bits  | Name  | Meaning |
/// |-------|-------|---------|
/// | 0     | `P`   | Present |
/// | 1     | `RW`  | Writable |
/// | 2     | `US`  | User accessible |
/// | 3     | `PWT` | PAT index bit 0 |
/// | 4     | `PCD` | PAT index bit 1 |
/// | 5     | `A`   | Accessed |
/// | 6     | `D`   | Dirty |
/// | 7     | `PAT` | PAT index bit 2 |
/// | 8     | `G`   | Global |
/// | 9–11  | avail | OS use; bit 9 marks raw PFN (`VM_PFNMAP`) mappings |
/// | 12–51 | addr  | Physical frame number |
/// | 52–62 | avail | OS use |
/// | 63    | `NX`  | Execute disable |
///
/// ```rust
/// # use dmamem_vmem::{CachePolicy, PageEntryBits};
/// let e = PageEntryBits::user_io(CachePolicy::WriteCombining);
/// assert!(e.present() && e.user_access() && e.writable());
/// assert_eq!(e.cache_policy(), Some(CachePolicy::WriteCombining));
/// ```
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct PageEntryBits {
    /// Present (P, bit 0).
    pub present: bool,

    /// Writable (RW, bit 1).
    pub writable: bool,

    /// User/Supervisor (US, bit 2).
    pub user_access: bool,

    /// Page Write-Through (PWT, bit 3); PAT index bit 0.
    pub write_through: bool,

    /// Page Cache Disable (PCD, bit 4); PAT index bit 1.
    pub cache_disabled: bool,

    /// Accessed (A, bit 5).
    pub accessed: bool,

    /// Dirty (D, bit 6).
    pub dirty: bool,

    /// PAT (bit 7); PAT index bit 2. Always clear for the slots we use.
    pub pat: bool,

    /// Global (G, bit 8).
    pub global_translation: bool,

    /// Set on entries that map raw frames not backed by `struct page`.
    pub pfn_map: bool,

    /// OS-available (bits 10..=11).
    #[bits(2)]
    pub os_available_low: u8,

    /// Physical frame number (bits 12..=51).
    #[bits(40)]
    frame_number: u64,

    /// OS-available (bits 52..=62).
    #[bits(11)]
    pub os_available_high: u16,

    /// No-Execute (NX, bit 63).
    pub no_execute: bool,
}

impl PageEntryBits {
    /// Leaf flags for a user mapping of device-owned memory with `policy`:
    /// present, writable, user, non-executable, raw-PFN.
    #[inline]
    #[must_use]
    pub const fn user_io(policy: CachePolicy) -> Self {
        let (pwt, pcd) = policy.pat_bits();
        Self::new()
            .with_present(true)
            .with_writable(true)
            .with_user_access(true)
            .with_write_through(pwt)
            .with_cache_disabled(pcd)
            .with_pat(false)
            .with_pfn_map(true)
            .with_no_execute(true)
    }

    /// The caching policy this entry selects, if it is one we program.
    #[inline]
    #[must_use]
    pub const fn cache_policy(&self) -> Option<CachePolicy> {
        if self.pat() {
            return None;
        }
        CachePolicy::from_pat_bits(self.write_through(), self.cache_disabled())
    }

    #[inline]
    pub const fn set_frame(&mut self, frame: PhysicalFrame<Size4K>) {
        self.set_frame_number(frame.number());
    }

    #[inline]
    #[must_use]
    pub const fn with_frame(self, frame: PhysicalFrame<Size4K>) -> Self {
        self.with_frame_number(frame.number())
    }

    #[inline]
    #[must_use]
    pub const fn frame(&self) -> PhysicalFrame<Size4K> {
        PhysicalFrame::from_number(self.frame_number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmamem_addresses::PhysicalAddress;

    #[test]
    fn user_io_entries_are_writable_nx_user_pages() {
        let e = PageEntryBits::user_io(CachePolicy::Uncached);
        assert!(e.present());
        assert!(e.writable());
        assert!(e.user_access());
        assert!(e.no_execute());
        assert!(e.pfn_map());
        assert!(e.write_through() && e.cache_disabled());
        assert_eq!(e.cache_policy(), Some(CachePolicy::Uncached));
    }

    #[test]
    fn frame_is_stored_without_low_bits() {
        let frame = PhysicalAddress::new(0x8000_0000).frame::<Size4K>();
        let e = PageEntryBits::user_io(CachePolicy::WriteCombining).with_frame(frame);
        assert_eq!(e.frame(), frame);
        assert_eq!(e.into_bits() & 0x000F_FFFF_FFFF_F000, 0x8000_0000);
        assert_eq!(e.cache_policy(), Some(CachePolicy::WriteCombining));
    }

    #[test]
    fn pat_bit_disqualifies_policy_decode() {
        let e = PageEntryBits::user_io(CachePolicy::Cached).with_pat(true);
        assert_eq!(e.cache_policy(), None);
    }
}
