//! # Mapping Handler
//!
//! Projects the region into a caller's address space. The handler only
//! reads the [`RegionDescriptor`] and only writes the caller's page tables,
//! so any number of callers may map concurrently without locking.
//!
//! ```text
//! caller VA  area.start ──────────────── area.start + area.len
//!                │  linear, one leaf per 4 KiB page  │
//! physical   physical_base ───────────── physical_base + area.len   (≤ size)
//! ```

use crate::{MapError, RegionDescriptor};
use dmamem_addresses::{PhysicalAddress, PhysicalFrame, Size4K, VirtualAddress};
use dmamem_vmem::{CachePolicy, PageEntryBits, UserAddressSpace, VmArea};
use log::{debug, warn};

/// A successfully installed mapping.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Mapped {
    pub start: VirtualAddress,
    pub len: u64,
    pub phys: PhysicalAddress,
    pub policy: CachePolicy,
}

#[derive(Debug, Copy, Clone)]
pub struct MappingHandler<'d> {
    region: &'d RegionDescriptor,
    policy: CachePolicy,
}

impl<'d> MappingHandler<'d> {
    #[must_use]
    pub const fn new(region: &'d RegionDescriptor, policy: CachePolicy) -> Self {
        Self { region, policy }
    }

    /// Map `area` onto the start of the region.
    ///
    /// # Errors
    /// - [`MapError::InvalidArgument`] if the area is empty or longer than
    ///   the region; nothing is installed.
    /// - [`MapError::MapFailed`] if the address space refuses the mapping;
    ///   it is left unchanged.
    pub fn map<S: UserAddressSpace + ?Sized>(
        &self,
        space: &mut S,
        area: VmArea,
    ) -> Result<Mapped, MapError> {
        let available = self.region.size();
        if area.is_empty() || area.len() > available {
            warn!(
                "rejecting mapping of {:#x} bytes, region holds {available:#x}",
                area.len()
            );
            return Err(MapError::InvalidArgument {
                requested: area.len(),
                available,
            });
        }

        let phys = self.region.physical_base();
        let frame = PhysicalFrame::<Size4K>::containing(phys);
        let flags = PageEntryBits::user_io(self.policy);

        space
            .remap_pfn_range(area.start(), frame, area.len(), flags)
            .inspect_err(|e| debug!("remap at {} failed: {e}", area.start()))?;

        debug!(
            "mapped {} + {:#x} -> {phys} ({})",
            area.start(),
            area.len(),
            self.policy
        );
        Ok(Mapped {
            start: area.start(),
            len: area.len(),
            phys,
            policy: self.policy,
        })
    }
}
