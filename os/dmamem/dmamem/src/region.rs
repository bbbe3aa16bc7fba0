use crate::InitError;
use dmamem_addresses::{PhysicalAddress, VirtualAddress};
use dmamem_alloc::{CoherentAllocator, CoherentBuffer, DmaMask, ReservedRegion};
use dmamem_topology::Node;
use log::{debug, error, info};

/// The established region. Immutable once published.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RegionDescriptor {
    physical_base: PhysicalAddress,
    virtual_base: VirtualAddress,
    size: u64,
}

impl RegionDescriptor {
    #[must_use]
    pub const fn new(physical_base: PhysicalAddress, virtual_base: VirtualAddress, size: u64) -> Self {
        Self {
            physical_base,
            virtual_base,
            size,
        }
    }

    #[must_use]
    pub const fn physical_base(&self) -> PhysicalAddress {
        self.physical_base
    }

    /// Kernel mapping of the region. Never handed to callers.
    #[must_use]
    pub const fn virtual_base(&self) -> VirtualAddress {
        self.virtual_base
    }

    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    const fn buffer(&self) -> CoherentBuffer {
        CoherentBuffer::new(self.physical_base, self.virtual_base, self.size)
    }
}

impl From<CoherentBuffer> for RegionDescriptor {
    fn from(b: CoherentBuffer) -> Self {
        Self::new(b.phys(), b.virt(), b.size())
    }
}

/// Binds a device to its reserved pool and allocates the region from it.
pub struct RegionAllocator<'a, A: CoherentAllocator + ?Sized> {
    allocator: &'a A,
    mask: DmaMask,
}

impl<'a, A: CoherentAllocator + ?Sized> RegionAllocator<'a, A> {
    #[must_use]
    pub const fn new(allocator: &'a A, mask: DmaMask) -> Self {
        Self { allocator, mask }
    }

    /// Bind the device's allocator to the pool described by `node`.
    ///
    /// # Errors
    /// [`InitError::ResourceExhausted`] if the node is not a usable pool or
    /// the allocator refuses it.
    pub fn bind(&self, node: &Node<'_>) -> Result<ReservedRegion, InitError> {
        let region = ReservedRegion::from_node(node)
            .and_then(|region| self.allocator.bind_reserved(&region).map(|()| region))
            .inspect_err(|e| error!("Failed to get reserved memory: {e}"))?;
        Ok(region)
    }

    pub fn unbind(&self) {
        self.allocator.release_reserved();
        debug!("released reserved pool");
    }

    /// Allocate `size` coherent bytes from the bound pool.
    ///
    /// # Errors
    /// [`InitError::ResourceExhausted`].
    pub fn allocate(&self, size: u64) -> Result<RegionDescriptor, InitError> {
        let buffer = self
            .allocator
            .alloc_coherent(size, self.mask)
            .inspect_err(|e| error!("Failed to allocate memory: {e}"))?;
        let region = RegionDescriptor::from(buffer);
        info!(
            "Allocated memory, vaddr: {:#x}, paddr: {:#x}",
            region.virtual_base().as_u64(),
            region.physical_base().as_u64()
        );
        Ok(region)
    }

    /// Return the region to the pool.
    pub fn free(&self, region: &RegionDescriptor) {
        match self.allocator.free_coherent(region.buffer()) {
            Ok(()) => debug!("freed region at {}", region.physical_base()),
            Err(e) => error!("Failed to free region at {}: {e}", region.physical_base()),
        }
    }
}
