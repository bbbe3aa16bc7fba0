//! # Direct-Map Physical Mapper
//!
//! Turns the physical address of a coherent buffer into the kernel virtual
//! address it is reachable at. With a direct map, every physical address is
//! visible at `DIRECT_MAP_BASE + pa`, so the translation is an addition.
//!
//! The seam is a trait because the strategy differs between environments:
//! a kernel with a direct map, a kernel that has to `memremap` a `no-map`
//! region, and the host tests, which only need stable, distinct values.

use dmamem_addresses::{PhysicalAddress, VirtualAddress};

/// Base of the kernel's linear map of physical memory (x86-64, 4-level paging).
pub const DIRECT_MAP_BASE: u64 = 0xFFFF_8880_0000_0000;

/// Physical-to-kernel-virtual translation.
pub trait PhysMapper {
    fn phys_to_virt(&self, pa: PhysicalAddress) -> VirtualAddress;
}

/// [`PhysMapper`] for a kernel that maps all of physical memory at a fixed offset.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DirectMapPhysMapper {
    base: u64,
}

impl DirectMapPhysMapper {
    #[must_use]
    pub const fn new(base: u64) -> Self {
        Self { base }
    }

    #[must_use]
    pub const fn base(&self) -> u64 {
        self.base
    }
}

impl Default for DirectMapPhysMapper {
    fn default() -> Self {
        Self::new(DIRECT_MAP_BASE)
    }
}

impl PhysMapper for DirectMapPhysMapper {
    fn phys_to_virt(&self, pa: PhysicalAddress) -> VirtualAddress {
        VirtualAddress::new(self.base.wrapping_add(pa.as_u64()))
    }
}
