use crate::{PageSize, PhysicalFrame, address::address_newtype};

/// An address on the memory bus, as the device and the CPU see it before
/// translation.
///
/// Carries intent only; the kernel cannot dereference it without going
/// through a mapper.
///
/// ```rust
/// # use dmamem_addresses::*;
/// let pa = PhysicalAddress::new(0x8000_0042);
/// assert_eq!(pa.frame::<Size4K>().base().as_u64(), 0x8000_0000);
/// assert_eq!(pa.offset::<Size4K>(), 0x42);
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalAddress(u64);

address_newtype!(PhysicalAddress, "PA");

impl PhysicalAddress {
    /// The `S`-sized frame this address falls into.
    #[inline]
    #[must_use]
    pub const fn frame<S: PageSize>(self) -> PhysicalFrame<S> {
        PhysicalFrame::containing(self)
    }
}
