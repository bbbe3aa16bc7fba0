//! # Hardware Topology Tree
//!
//! A queryable, in-memory device tree: nodes with named properties whose
//! values are sequences of big-endian 32-bit **cells**. The driver only ever
//! asks three kinds of questions of it:
//!
//! 1. *Which node am I?* match by `compatible` or by path.
//! 2. *Where is my memory?* follow a phandle reference such as
//!    `memory-region = <&bank0>` to the node describing the reserved range.
//! 3. *How big is it?* decode a 64-bit value out of two cells of `reg`.
//!
//! ## Cell encoding
//!
//! A 64-bit value at logical index *i* is the concatenation of the cells at
//! raw offsets `2i` (high word) and `2i + 1` (low word):
//!
//! ```text
//! reg = < 0x0 0x80000000   0x0 0x20000000 >;
//!        |  index 0     |  |  index 1     |
//!        |  address     |  |  size        |
//! ```
//!
//! ```rust
//! use dmamem_topology::{CellPairDecoder, DeviceTree};
//!
//! let mut dt = DeviceTree::new();
//! let bank = dt.add_child(dt.root_id(), "bank0@0");
//! dt.set_cells(bank, "reg", &[0x0, 0x8000_0000, 0x0, 0x2000_0000]);
//!
//! let size = CellPairDecoder::read_u64(&dt.node(bank), "reg", 1).unwrap();
//! assert_eq!(size, 0x2000_0000);
//! ```
//!
//! ## Building trees
//!
//! Trees are either assembled programmatically ([`DeviceTree::add_child`],
//! [`DeviceTree::set_cells`], ...) or, with the `fdt` feature, imported from
//! a flattened device tree blob via [`DeviceTree::from_fdt`].

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

mod cells;
mod error;
#[cfg(feature = "fdt")]
mod flattened;
mod node;
mod property;
mod tree;

pub use cells::CellPairDecoder;
pub use error::TopologyError;
pub use node::Node;
pub use property::Property;
pub use tree::{DeviceTree, NodeId};

/// Property naming the node's own phandle.
pub const PHANDLE: &str = "phandle";

/// Legacy spelling of [`PHANDLE`] still emitted by older compilers.
pub const LINUX_PHANDLE: &str = "linux,phandle";

/// Property listing compatible strings.
pub const COMPATIBLE: &str = "compatible";
