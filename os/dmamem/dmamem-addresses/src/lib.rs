//! # Physical and Virtual Address Types
//!
//! Strongly typed wrappers for the addresses a reserved-memory driver moves
//! around: the bus address handed to the device, the kernel's direct-map view
//! of the same buffer, and the caller's mapping of it.
//!
//! | Type | Meaning |
//! |------|---------|
//! | [`PhysicalAddress`] / [`PhysicalFrame<S>`] | Physical memory (what the device sees). |
//! | [`VirtualAddress`] / [`VirtualPage<S>`] | Translated memory (kernel or caller view). |
//!
//! Granules are type-level markers implementing [`PageSize`]; [`Size4K`]
//! covers both user mappings and pool alignment.
//!
//! ```rust
//! # use dmamem_addresses::*;
//! let pa = PhysicalAddress::new(0x8000_0000);
//! let frame = pa.frame::<Size4K>();
//! assert_eq!(frame.number(), 0x8_0000);
//! assert_eq!(PhysicalFrame::<Size4K>::from_number(0x8_0000).base(), pa);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

mod address;
mod frame;
mod page_size;
mod physical_address;
mod virtual_address;

pub use frame::{PhysicalFrame, VirtualPage};
pub use page_size::{PageSize, Size4K};
pub use physical_address::PhysicalAddress;
pub use virtual_address::VirtualAddress;

/// Align `x` down to the nearest multiple of `a`.
///
/// `a` must be a non-zero power of two.
///
/// ```rust
/// # use dmamem_addresses::align_down;
/// assert_eq!(align_down(4095, 4096), 0);
/// assert_eq!(align_down(8191, 4096), 4096);
/// ```
#[inline]
#[must_use]
pub const fn align_down(x: u64, a: u64) -> u64 {
    x & !(a - 1)
}

/// Align `x` up to the nearest multiple of `a`, or `None` on overflow.
///
/// `a` must be a non-zero power of two.
///
/// ```rust
/// # use dmamem_addresses::align_up;
/// assert_eq!(align_up(1, 4096), Some(4096));
/// assert_eq!(align_up(4096, 4096), Some(4096));
/// assert_eq!(align_up(u64::MAX, 4096), None);
/// ```
#[inline]
#[must_use]
pub const fn align_up(x: u64, a: u64) -> Option<u64> {
    match x.checked_add(a - 1) {
        Some(v) => Some(v & !(a - 1)),
        None => None,
    }
}

/// Number of `S` pages needed to cover `len` bytes.
#[inline]
#[must_use]
pub const fn pages_for<S: PageSize>(len: u64) -> u64 {
    (len >> S::SHIFT) + if len & (S::SIZE - 1) == 0 { 0 } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_numbers_round_trip_through_base() {
        let pa = PhysicalAddress::new(0x9FFF_F123);
        let frame = pa.frame::<Size4K>();
        assert_eq!(frame.base().as_u64(), 0x9FFF_F000);
        assert_eq!(frame.number(), 0x9_FFFF);
        assert_eq!(frame.forward(1).base().as_u64(), 0xA000_0000);
        assert_eq!(pa.offset::<Size4K>(), 0x123);
    }

    #[test]
    fn alignment_predicates() {
        assert!(PhysicalAddress::new(0x8000_1000).is_aligned::<Size4K>());
        assert!(!PhysicalAddress::new(0x8000_1008).is_aligned::<Size4K>());
        assert!(VirtualAddress::new(0x7000_0000).is_aligned::<Size4K>());
        assert!(!VirtualAddress::new(0x7000_0001).is_aligned::<Size4K>());
    }

    #[test]
    fn virtual_pages_step_by_granule() {
        let page = VirtualAddress::new(0x1234_5678).page::<Size4K>();
        assert_eq!(page.base().as_u64(), 0x1234_5000);
        assert_eq!(page.forward(2).base().as_u64(), 0x1234_7000);
        assert_eq!(page.number(), 0x12345);
    }

    #[test]
    fn page_counts_round_up() {
        assert_eq!(pages_for::<Size4K>(0), 0);
        assert_eq!(pages_for::<Size4K>(1), 1);
        assert_eq!(pages_for::<Size4K>(4096), 1);
        assert_eq!(pages_for::<Size4K>(4097), 2);
        assert_eq!(pages_for::<Size4K>(0x2000_0000), 0x2_0000);
    }

    #[test]
    fn checked_add_detects_overflow() {
        assert_eq!(PhysicalAddress::new(u64::MAX).checked_add(1), None);
        assert_eq!(
            VirtualAddress::new(0x1000).checked_add(0x1000),
            Some(VirtualAddress::new(0x2000))
        );
    }

    #[test]
    fn debug_formatting_names_the_kind() {
        assert_eq!(
            format!("{:?}", PhysicalAddress::new(0x8000_0000)),
            "PA(0x0000000080000000)"
        );
        assert_eq!(
            format!("{:?}", VirtualAddress::new(0x10)),
            "VA(0x0000000000000010)"
        );
    }
}
