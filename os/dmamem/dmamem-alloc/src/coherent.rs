use crate::{DmaMask, ReservedRegion};
use dmamem_addresses::{PhysicalAddress, VirtualAddress};

/// A physically contiguous buffer visible to both the CPU and the device.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CoherentBuffer {
    phys: PhysicalAddress,
    virt: VirtualAddress,
    size: u64,
}

impl CoherentBuffer {
    #[must_use]
    pub const fn new(phys: PhysicalAddress, virt: VirtualAddress, size: u64) -> Self {
        Self { phys, virt, size }
    }

    /// Bus/physical address of the first byte.
    #[must_use]
    pub const fn phys(&self) -> PhysicalAddress {
        self.phys
    }

    /// Kernel virtual address of the first byte.
    #[must_use]
    pub const fn virt(&self) -> VirtualAddress {
        self.virt
    }

    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum CoherentAllocError {
    #[error("no reserved pool is bound")]
    NotBound,
    #[error("a reserved pool is already bound")]
    AlreadyBound,
    #[error("no contiguous block of {0:#x} bytes available")]
    OutOfMemory(u64),
    #[error("no block of {size:#x} bytes within DMA limit {limit:#x}")]
    MaskViolation { size: u64, limit: u64 },
    #[error("invalid region: {0}")]
    InvalidRegion(&'static str),
}

/// The platform's DMA-capable allocator, as seen by one device.
///
/// Methods take `&self`; implementations serialize internally.
pub trait CoherentAllocator {
    /// Make `region` the pool that subsequent allocations are served from.
    ///
    /// # Errors
    /// [`CoherentAllocError::AlreadyBound`] or [`CoherentAllocError::InvalidRegion`].
    fn bind_reserved(&self, region: &ReservedRegion) -> Result<(), CoherentAllocError>;

    /// Forget the bound pool. A no-op if none is bound.
    fn release_reserved(&self);

    /// Allocate `size` bytes (rounded up to pages) addressable under `mask`.
    ///
    /// # Errors
    /// See [`CoherentAllocError`].
    fn alloc_coherent(&self, size: u64, mask: DmaMask)
    -> Result<CoherentBuffer, CoherentAllocError>;

    /// Return a buffer obtained from [`alloc_coherent`](Self::alloc_coherent).
    ///
    /// # Errors
    /// [`CoherentAllocError::InvalidRegion`] if `buffer` is not live.
    fn free_coherent(&self, buffer: CoherentBuffer) -> Result<(), CoherentAllocError>;
}
