//! First-fit allocator over a bound reserved region.
//!
//! Free space is kept as an address-ordered map of `base → len` so that a
//! returned block can be coalesced with both neighbors on insertion.

use crate::{
    CoherentAllocError, CoherentAllocator, CoherentBuffer, DirectMapPhysMapper, DmaMask,
    PhysMapper, ReservedRegion,
};
use alloc::collections::BTreeMap;
use dmamem_addresses::{PageSize, PhysicalAddress, Size4K, align_up};
use dmamem_sync::SpinLock;
use log::{debug, warn};

#[derive(Default)]
struct PoolState {
    region: Option<ReservedRegion>,
    /// Free blocks, `base → len`, never adjacent.
    free: BTreeMap<u64, u64>,
    /// Live allocations, `base → len`.
    live: BTreeMap<u64, u64>,
}

impl PoolState {
    fn insert_free(&mut self, mut base: u64, mut len: u64) {
        if let Some((&prev, &prev_len)) = self.free.range(..base).next_back()
            && prev + prev_len == base
        {
            self.free.remove(&prev);
            base = prev;
            len += prev_len;
        }
        if let Some(next_len) = self.free.remove(&(base + len)) {
            len += next_len;
        }
        self.free.insert(base, len);
    }
}

/// [`CoherentAllocator`] serving a single `shared-dma-pool` region.
pub struct ReservedPoolAllocator<M: PhysMapper = DirectMapPhysMapper> {
    mapper: M,
    state: SpinLock<PoolState>,
}

impl Default for ReservedPoolAllocator {
    fn default() -> Self {
        Self::new(DirectMapPhysMapper::default())
    }
}

impl<M: PhysMapper> ReservedPoolAllocator<M> {
    #[must_use]
    pub fn new(mapper: M) -> Self {
        Self {
            mapper,
            state: SpinLock::new(PoolState::default()),
        }
    }

    /// The bound region, if any.
    #[must_use]
    pub fn region(&self) -> Option<ReservedRegion> {
        self.state.with_lock(|s| s.region)
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.region().is_some()
    }

    /// Bytes currently handed out.
    #[must_use]
    pub fn allocated_bytes(&self) -> u64 {
        self.state.with_lock(|s| s.live.values().sum())
    }

    /// Bytes still available, counting fragmented space.
    #[must_use]
    pub fn free_bytes(&self) -> u64 {
        self.state.with_lock(|s| s.free.values().sum())
    }
}

impl<M: PhysMapper> CoherentAllocator for ReservedPoolAllocator<M> {
    fn bind_reserved(&self, region: &ReservedRegion) -> Result<(), CoherentAllocError> {
        if region.size() == 0 {
            return Err(CoherentAllocError::InvalidRegion("empty region"));
        }
        if !region.base().is_aligned::<Size4K>() {
            return Err(CoherentAllocError::InvalidRegion("unaligned base"));
        }
        if region.end().is_none() {
            return Err(CoherentAllocError::InvalidRegion("region wraps"));
        }

        let mut state = self.state.lock();
        if state.region.is_some() {
            return Err(CoherentAllocError::AlreadyBound);
        }

        // A trailing partial page is not allocatable.
        let usable = region.size() & !(Size4K::SIZE - 1);
        if usable == 0 {
            return Err(CoherentAllocError::InvalidRegion("smaller than a page"));
        }

        state.region = Some(*region);
        state.free.clear();
        state.live.clear();
        state.free.insert(region.base().as_u64(), usable);
        debug!(
            "bound reserved pool {} + {:#x}{}",
            region.base(),
            region.size(),
            if region.no_map() { " (no-map)" } else { "" }
        );
        Ok(())
    }

    fn release_reserved(&self) {
        let mut state = self.state.lock();
        if let Some(region) = state.region.take() {
            if !state.live.is_empty() {
                warn!(
                    "releasing pool {} with {} live allocation(s)",
                    region.base(),
                    state.live.len()
                );
            }
            state.free.clear();
            state.live.clear();
            debug!("released reserved pool {}", region.base());
        }
    }

    fn alloc_coherent(
        &self,
        size: u64,
        mask: DmaMask,
    ) -> Result<CoherentBuffer, CoherentAllocError> {
        if size == 0 {
            return Err(CoherentAllocError::InvalidRegion("zero-sized allocation"));
        }
        let rounded = align_up(size, Size4K::SIZE).ok_or(CoherentAllocError::OutOfMemory(size))?;

        let mut state = self.state.lock();
        if state.region.is_none() {
            return Err(CoherentAllocError::NotBound);
        }

        // First fit; blocks are address-ordered, so the first block large
        // enough is also the lowest and the only one worth checking the mask on.
        let Some((base, len)) = state
            .free
            .iter()
            .find(|(_, len)| **len >= rounded)
            .map(|(b, l)| (*b, *l))
        else {
            return Err(CoherentAllocError::OutOfMemory(size));
        };
        if !mask.allows(PhysicalAddress::new(base), rounded) {
            return Err(CoherentAllocError::MaskViolation {
                size,
                limit: mask.limit(),
            });
        }

        state.free.remove(&base);
        if len > rounded {
            state.free.insert(base + rounded, len - rounded);
        }
        state.live.insert(base, rounded);
        drop(state);

        let phys = PhysicalAddress::new(base);
        let buffer = CoherentBuffer::new(phys, self.mapper.phys_to_virt(phys), size);
        debug!("coherent alloc {phys} + {size:#x}");
        Ok(buffer)
    }

    fn free_coherent(&self, buffer: CoherentBuffer) -> Result<(), CoherentAllocError> {
        let mut state = self.state.lock();
        if state.region.is_none() {
            return Err(CoherentAllocError::NotBound);
        }
        let base = buffer.phys().as_u64();
        let len = state
            .live
            .remove(&base)
            .ok_or(CoherentAllocError::InvalidRegion("buffer not allocated"))?;
        state.insert_free(base, len);
        debug!("coherent free {} + {:#x}", buffer.phys(), buffer.size());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> ReservedPoolAllocator {
        let a: ReservedPoolAllocator = ReservedPoolAllocator::default();
        a.bind_reserved(&ReservedRegion::new(
            PhysicalAddress::new(0x8000_0000),
            0x10_0000,
            true,
        ))
        .unwrap();
        a
    }

    #[test]
    fn allocations_are_page_rounded_and_disjoint() {
        let a = pool();
        let x = a.alloc_coherent(1, DmaMask::bits(32)).unwrap();
        let y = a.alloc_coherent(0x1800, DmaMask::bits(32)).unwrap();
        assert_eq!(x.phys(), PhysicalAddress::new(0x8000_0000));
        assert_eq!(y.phys(), PhysicalAddress::new(0x8000_1000));
        assert_eq!(x.size(), 1);
        assert_eq!(a.allocated_bytes(), 0x3000);
        assert_eq!(a.free_bytes(), 0x10_0000 - 0x3000);
    }

    #[test]
    fn freed_blocks_coalesce() {
        let a = pool();
        let x = a.alloc_coherent(0x1000, DmaMask::bits(32)).unwrap();
        let y = a.alloc_coherent(0x1000, DmaMask::bits(32)).unwrap();
        let z = a.alloc_coherent(0x1000, DmaMask::bits(32)).unwrap();

        a.free_coherent(x).unwrap();
        a.free_coherent(z).unwrap();
        a.free_coherent(y).unwrap();

        assert_eq!(a.allocated_bytes(), 0);
        let whole = a.alloc_coherent(0x10_0000, DmaMask::bits(32)).unwrap();
        assert_eq!(whole.phys(), PhysicalAddress::new(0x8000_0000));
    }

    #[test]
    fn double_free_is_rejected() {
        let a = pool();
        let x = a.alloc_coherent(0x1000, DmaMask::bits(32)).unwrap();
        a.free_coherent(x).unwrap();
        assert!(matches!(
            a.free_coherent(x),
            Err(CoherentAllocError::InvalidRegion(_))
        ));
    }

    #[test]
    fn unbound_pool_refuses_work() {
        let a: ReservedPoolAllocator = ReservedPoolAllocator::default();
        assert_eq!(
            a.alloc_coherent(0x1000, DmaMask::bits(32)),
            Err(CoherentAllocError::NotBound)
        );
    }
}
