//! # Coherent Allocation from Reserved Memory
//!
//! The allocation side of the driver: once the topology says which
//! carve-out backs the device, the device's coherent allocator is bound to
//! that carve-out and the whole buffer is allocated from it in one piece.
//!
//! ```text
//! /reserved-memory/bank0@0 ──► ReservedRegion ──bind──► ReservedPoolAllocator
//!                                                            │ alloc_coherent(size, DmaMask)
//!                                                            ▼
//!                                                      CoherentBuffer { phys, virt, size }
//! ```
//!
//! - [`ReservedRegion`] reads `reg` (`{address, size}` cell pairs) and the
//!   `no-map` flag from a `shared-dma-pool` node.
//! - [`CoherentAllocator`] is the seam the driver allocates through;
//!   [`ReservedPoolAllocator`] is the first-fit implementation over one
//!   bound region.
//! - [`DmaMask`] expresses how much physical address space the device can
//!   reach; allocations beyond it fail with
//!   [`CoherentAllocError::MaskViolation`].
//! - [`PhysMapper`] supplies the kernel virtual address of a buffer;
//!   [`DirectMapPhysMapper`] assumes a linear map at [`DIRECT_MAP_BASE`].
//!
//! ## Example
//! ```rust
//! use dmamem_addresses::PhysicalAddress;
//! use dmamem_alloc::{CoherentAllocator, DmaMask, ReservedPoolAllocator, ReservedRegion};
//!
//! let pool: ReservedPoolAllocator = ReservedPoolAllocator::default();
//! let region = ReservedRegion::new(PhysicalAddress::new(0x8000_0000), 0x20_0000, true);
//! pool.bind_reserved(&region).unwrap();
//!
//! let buf = pool.alloc_coherent(0x1000, DmaMask::bits(32)).unwrap();
//! assert_eq!(buf.phys(), PhysicalAddress::new(0x8000_0000));
//! pool.free_coherent(buf).unwrap();
//! pool.release_reserved();
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

mod coherent;
mod dma_mask;
pub mod phys_mapper;
mod pool;
mod reserved_region;

pub use coherent::{CoherentAllocError, CoherentAllocator, CoherentBuffer};
pub use dma_mask::DmaMask;
pub use phys_mapper::{DIRECT_MAP_BASE, DirectMapPhysMapper, PhysMapper};
pub use pool::ReservedPoolAllocator;
pub use reserved_region::{ReservedRegion, SHARED_DMA_POOL};
