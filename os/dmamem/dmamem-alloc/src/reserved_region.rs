use crate::CoherentAllocError;
use dmamem_addresses::PhysicalAddress;
use dmamem_topology::{CellPairDecoder, Node};
use log::error;

/// `compatible` value of a reserved region usable as a coherent pool.
pub const SHARED_DMA_POOL: &str = "shared-dma-pool";

/// A `/reserved-memory` child describing a carve-out.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ReservedRegion {
    base: PhysicalAddress,
    size: u64,
    no_map: bool,
}

impl ReservedRegion {
    #[must_use]
    pub const fn new(base: PhysicalAddress, size: u64, no_map: bool) -> Self {
        Self {
            base,
            size,
            no_map,
        }
    }

    /// Read a shared DMA pool description from `node`.
    ///
    /// The node must be `compatible = "shared-dma-pool"` and carry a `reg`
    /// of two-cell `{address, size}` pairs; the first pair is used.
    ///
    /// # Errors
    /// [`CoherentAllocError::InvalidRegion`] naming what is wrong.
    pub fn from_node(node: &Node<'_>) -> Result<Self, CoherentAllocError> {
        if !node.is_compatible(SHARED_DMA_POOL) {
            error!("{} is not a {SHARED_DMA_POOL}", node.path());
            return Err(CoherentAllocError::InvalidRegion("not a shared-dma-pool"));
        }

        let base = CellPairDecoder::read_u64(node, "reg", 0).map_err(|e| {
            error!("{}: {e}", node.path());
            CoherentAllocError::InvalidRegion("missing base address")
        })?;
        let size = CellPairDecoder::read_u64(node, "reg", 1).map_err(|e| {
            error!("{}: {e}", node.path());
            CoherentAllocError::InvalidRegion("missing size")
        })?;

        Ok(Self::new(
            PhysicalAddress::new(base),
            size,
            node.has_property("no-map"),
        ))
    }

    #[must_use]
    pub const fn base(&self) -> PhysicalAddress {
        self.base
    }

    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Whether the region is excluded from the kernel's linear map.
    #[must_use]
    pub const fn no_map(&self) -> bool {
        self.no_map
    }

    /// Exclusive end, or `None` if the region wraps.
    #[must_use]
    pub const fn end(&self) -> Option<PhysicalAddress> {
        self.base.checked_add(self.size)
    }
}
