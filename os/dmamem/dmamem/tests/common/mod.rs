#![allow(dead_code)]

use dmamem::{DmaMemDriver, DriverConfig, InMemoryRegistry};
use dmamem_alloc::{
    CoherentAllocError, CoherentAllocator, CoherentBuffer, DmaMask, ReservedPoolAllocator,
    ReservedRegion,
};
use dmamem_topology::{DeviceTree, NodeId};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const POOL_BASE: u64 = 0x8000_0000;
pub const POOL_SIZE: u64 = 0x2000_0000;

/// Device tree with a 512 MiB shared-dma-pool at 2 GiB referenced by a
/// `dmamem` device node. Returns the tree and the device node.
pub fn reserved_memory_tree() -> (DeviceTree, NodeId) {
    tree_with_reg(&[0x0, 0x8000_0000, 0x0, 0x2000_0000])
}

pub fn tree_with_reg(reg: &[u32]) -> (DeviceTree, NodeId) {
    let mut dt = DeviceTree::new();
    let root = dt.root_id();

    let reserved = dt.add_child(root, "reserved-memory");
    dt.set_cells(reserved, "#address-cells", &[2]);
    dt.set_cells(reserved, "#size-cells", &[2]);
    dt.set_flag(reserved, "ranges");

    let bank = dt.add_child(reserved, "bank0@0");
    dt.set_flag(bank, "no-map");
    dt.set_strings(bank, "compatible", &["shared-dma-pool"]);
    dt.set_phandle(bank, 0x1);
    dt.set_cells(bank, "reg", reg);

    let dev = dt.add_child(root, "reserved-driver@0");
    dt.set_strings(dev, "compatible", &["dmamem"]);
    dt.set_cells(dev, "memory-region", &[0x1]);

    (dt, dev)
}

pub fn driver() -> DmaMemDriver {
    DmaMemDriver::new(
        DriverConfig::default(),
        InMemoryRegistry::new(),
        ReservedPoolAllocator::default(),
    )
}

/// Wraps the pool allocator, counting binds and failing allocations on demand.
#[derive(Default)]
pub struct CountingAllocator {
    pub inner: ReservedPoolAllocator,
    pub binds: AtomicUsize,
    pub releases: AtomicUsize,
    pub exhausted: bool,
}

impl CountingAllocator {
    pub fn exhausted() -> Self {
        Self {
            exhausted: true,
            ..Self::default()
        }
    }
}

impl CoherentAllocator for CountingAllocator {
    fn bind_reserved(&self, region: &ReservedRegion) -> Result<(), CoherentAllocError> {
        self.binds.fetch_add(1, Ordering::SeqCst);
        self.inner.bind_reserved(region)
    }

    fn release_reserved(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.inner.release_reserved();
    }

    fn alloc_coherent(
        &self,
        size: u64,
        mask: DmaMask,
    ) -> Result<CoherentBuffer, CoherentAllocError> {
        if self.exhausted {
            return Err(CoherentAllocError::OutOfMemory(size));
        }
        self.inner.alloc_coherent(size, mask)
    }

    fn free_coherent(&self, buffer: CoherentBuffer) -> Result<(), CoherentAllocError> {
        self.inner.free_coherent(buffer)
    }
}
