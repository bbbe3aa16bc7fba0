use crate::{PageSize, VirtualPage, address::address_newtype};

/// A translated address: the kernel's direct-map view of a buffer, or the
/// caller's view of a mapping. Canonicality is not checked.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VirtualAddress(u64);

address_newtype!(VirtualAddress, "VA");

impl VirtualAddress {
    #[inline]
    #[must_use]
    pub const fn page<S: PageSize>(self) -> VirtualPage<S> {
        VirtualPage::containing(self)
    }
}
