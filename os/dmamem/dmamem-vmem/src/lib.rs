//! # Virtual Memory Support for Device Mappings
//!
//! The pieces the mapping handler needs to project a physical range into a
//! caller's address space:
//!
//! - [`PageEntryBits`]: the x86-64 4 KiB leaf entry, built with
//!   [`bitfield_struct`], including the PAT bits selecting a
//!   [`CachePolicy`].
//! - [`UserAddressSpace`]: the seam to the caller's page tables, with
//!   [`VmArea`] describing the requested window.
//! - [`PhysicalMemory`], [`SimulatedRam`] and [`SoftAddressSpace`]: a host
//!   rendition of the memory bus and of a process' page tables, used by the
//!   probe tool and the tests.
//!
//! ## Write-combining on x86-64
//!
//! The attribute of a 4 KiB page is chosen by a 3-bit PAT index formed from
//! `PAT:PCD:PWT`. With the PAT MSR in the layout Linux programs, index 1 is
//! write-combining, which is what [`CachePolicy::WriteCombining`] selects.
//!
//! ```text
//! index  PAT PCD PWT   type
//!   0     0   0   0    WB   (CachePolicy::Cached)
//!   1     0   0   1    WC   (CachePolicy::WriteCombining)
//!   3     0   1   1    UC   (CachePolicy::Uncached)
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

pub mod address_space;
mod cache_policy;
mod memory;
mod page_entry_bits;
mod soft;

pub use address_space::{RemapError, UserAddressSpace, UserFault, VmArea};
pub use cache_policy::{CachePolicy, ParseCachePolicyError};
pub use memory::{PhysicalMemory, SimulatedRam};
pub use page_entry_bits::PageEntryBits;
pub use soft::SoftAddressSpace;
