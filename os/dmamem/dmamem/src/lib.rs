//! # Reserved Memory Character Device
//!
//! Exposes one physically contiguous, firmware-reserved memory region to
//! user space through a character device whose only interesting operation
//! is `mmap`. Where the region lives and how large it is comes from the
//! device tree at probe time:
//!
//! ```text
//! / {
//!     reserved-memory {
//!         #address-cells = <2>;
//!         #size-cells = <2>;
//!         ranges;
//!
//!         bank0: bank0@0 {
//!             no-map;
//!             compatible = "shared-dma-pool";
//!             reg = <0x0 0x80000000 0x0 0x20000000>;   // 512 MiB at 2 GiB
//!         };
//!     };
//!
//!     reserved-driver@0 {
//!         compatible = "dmamem";
//!         memory-region = <&bank0>;
//!     };
//! };
//! ```
//!
//! ## Flow
//!
//! ```text
//! initialize(node)
//!   ├─ Registration::acquire      device number, cdev, class, device node
//!   ├─ RegionDescriptorResolver   memory-region → bank0, reg[1] → size
//!   ├─ RegionAllocator            bind shared-dma-pool, alloc_coherent(size, mask)
//!   ├─ WriteOnce<RegionDescriptor>
//!   └─ publish                    /dev/dmamem becomes visible
//!
//! map_memory / mmap ─► MappingHandler ─► UserAddressSpace::remap_pfn_range
//! read              ─► DiagnosticChannel ─► UserAddressSpace::copy_to_user
//! ```
//!
//! The region descriptor is written exactly once per lifetime and only read
//! afterwards, so mapping and reading need no locks. Every step of
//! initialization is undone in reverse order if a later one fails.
//!
//! ## Example
//!
//! ```rust
//! use dmamem::{DmaMemDriver, DriverConfig, InMemoryRegistry, MapError};
//! use dmamem_alloc::ReservedPoolAllocator;
//! use dmamem_topology::DeviceTree;
//! use dmamem_vmem::{SimulatedRam, SoftAddressSpace};
//!
//! let mut dt = DeviceTree::new();
//! let reserved = dt.add_child(dt.root_id(), "reserved-memory");
//! let bank = dt.add_child(reserved, "bank0@0");
//! dt.set_flag(bank, "no-map");
//! dt.set_strings(bank, "compatible", &["shared-dma-pool"]);
//! dt.set_phandle(bank, 1);
//! dt.set_cells(bank, "reg", &[0x0, 0x8000_0000, 0x0, 0x2000_0000]);
//! let dev = dt.add_child(dt.root_id(), "reserved-driver@0");
//! dt.set_strings(dev, "compatible", &["dmamem"]);
//! dt.set_cells(dev, "memory-region", &[1]);
//!
//! let mut driver: DmaMemDriver = DmaMemDriver::new(
//!     DriverConfig::default(),
//!     InMemoryRegistry::new(),
//!     ReservedPoolAllocator::default(),
//! );
//! driver.probe(&dt.node(dev)).unwrap();
//!
//! let ram = SimulatedRam::new();
//! let mut space = SoftAddressSpace::new(&ram);
//! assert!(driver.map_memory(&mut space, 0x1000).is_ok());
//! assert!(matches!(
//!     driver.map_memory(&mut space, 0x2000_0001),
//!     Err(MapError::InvalidArgument { .. })
//! ));
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

mod config;
pub mod diagnostic;
mod error;
mod fops;
mod lifecycle;
pub mod mmap;
mod region;
pub mod registry;
mod resolver;

pub use config::DriverConfig;
pub use diagnostic::{DiagnosticChannel, MESSAGE};
pub use error::{InitError, IoError, MapError};
pub use lifecycle::{DmaMemDriver, LifecycleState};
pub use mmap::{Mapped, MappingHandler};
pub use region::{RegionAllocator, RegionDescriptor};
pub use registry::{
    DeviceNumber, DeviceRegistry, InMemoryRegistry, Registration, RegistrationStep, RegistryError,
};
pub use resolver::{RegionDescriptorResolver, ResolvedRegion};
