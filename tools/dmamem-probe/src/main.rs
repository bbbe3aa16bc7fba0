//! Probe the reserved-memory driver on the host.
//!
//! Builds (or loads) a device tree, binds the driver to every compatible
//! node, maps the region into a simulated process, and checks that bytes
//! written through the mapping land in the reserved physical range.

mod args;
mod logger;

use args::{Args, USAGE};
use dmamem::{DmaMemDriver, DriverConfig, InMemoryRegistry, InitError, IoError, MapError};
use dmamem_addresses::PhysicalAddress;
use dmamem_alloc::ReservedPoolAllocator;
use dmamem_topology::{DeviceTree, TopologyError};
use dmamem_vmem::{PhysicalMemory, SimulatedRam, SoftAddressSpace, UserFault};
use log::{error, info, warn};

use std::process::ExitCode;
use std::{env, fs};

#[derive(Debug, thiserror::Error)]
enum ProbeError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error("no node is compatible with `{0}`")]
    NoDevice(&'static str),
    #[error(transparent)]
    Init(#[from] InitError),
    #[error(transparent)]
    Map(#[from] MapError),
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Fault(#[from] UserFault),
    #[error("mapping does not alias physical memory")]
    Mismatch,
}

fn main() -> ExitCode {
    let args = match Args::parse(env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}\n{USAGE}");
            return ExitCode::from(2);
        }
    };
    if args.help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }
    if logger::install(args.log).is_err() {
        eprintln!("logger already installed");
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), ProbeError> {
    let tree = match &args.dtb {
        Some(path) => {
            let blob = fs::read(path).map_err(|source| ProbeError::Read {
                path: path.display().to_string(),
                source,
            })?;
            DeviceTree::from_fdt(&blob)?
        }
        None => demo_tree(),
    };

    let config = DriverConfig::new().with_cache_policy(args.policy);
    let mut driver: DmaMemDriver = DmaMemDriver::new(
        config,
        InMemoryRegistry::new(),
        ReservedPoolAllocator::default(),
    );

    let node = tree
        .nodes()
        .find(|n| driver.matches(n))
        .ok_or(ProbeError::NoDevice(config.compatible))?;
    driver.probe(&node)?;

    for path in driver.registry().published_nodes() {
        info!("published {path}");
    }

    exercise(&driver)?;
    driver.remove();
    Ok(())
}

/// Map the region, write through the mapping, read it back physically.
fn exercise(driver: &DmaMemDriver) -> Result<(), ProbeError> {
    let ram = SimulatedRam::new();
    let mut space = SoftAddressSpace::new(&ram);

    let size = driver.region().map_or(0, dmamem::RegionDescriptor::size);
    let mapped = driver.map_memory(&mut space, size)?;
    info!(
        "mapped {:#x} bytes at {} ({})",
        mapped.len, mapped.start, mapped.policy
    );

    let pattern = b"dmamem";
    let last = mapped.start + (mapped.len - pattern.len() as u64);
    space.write(mapped.start, pattern)?;
    space.write(last, pattern)?;

    let mut seen = [0u8; 6];
    ram.read(mapped.phys, &mut seen);
    let mut tail = [0u8; 6];
    ram.read(
        PhysicalAddress::new(mapped.phys.as_u64() + mapped.len - pattern.len() as u64),
        &mut tail,
    );
    if &seen != pattern || &tail != pattern {
        return Err(ProbeError::Mismatch);
    }

    match driver.map_memory(&mut space, size + 1) {
        Err(e @ MapError::InvalidArgument { .. }) => info!("oversized mapping refused: {e}"),
        Ok(m) => warn!("oversized mapping accepted at {}", m.start),
        Err(e) => return Err(e.into()),
    }

    let mut pos = 0;
    let n = driver.read(&space, mapped.start, 64, &mut pos)?;
    let mut msg = vec![0u8; n];
    space.read(mapped.start, &mut msg)?;
    info!("read: {}", String::from_utf8_lossy(&msg).trim_end());
    Ok(())
}

/// Reserved bank at 2 GiB with 512 MiB, referenced by a `dmamem` node.
fn demo_tree() -> DeviceTree {
    let mut dt = DeviceTree::new();
    let root = dt.root_id();
    dt.set_cells(root, "#address-cells", &[2]);
    dt.set_cells(root, "#size-cells", &[2]);

    let reserved = dt.add_child(root, "reserved-memory");
    dt.set_cells(reserved, "#address-cells", &[2]);
    dt.set_cells(reserved, "#size-cells", &[2]);
    dt.set_flag(reserved, "ranges");

    let bank = dt.add_child(reserved, "bank0@0");
    dt.set_flag(bank, "no-map");
    dt.set_strings(bank, "compatible", &["shared-dma-pool"]);
    dt.set_phandle(bank, 1);
    dt.set_cells(bank, "reg", &[0x0, 0x8000_0000, 0x0, 0x2000_0000]);

    let dev = dt.add_child(root, "reserved-driver@0");
    dt.set_strings(dev, "compatible", &["dmamem"]);
    dt.set_cells(dev, "memory-region", &[1]);
    dt
}
