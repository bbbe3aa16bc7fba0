mod common;

use common::{CountingAllocator, POOL_BASE, POOL_SIZE, driver, reserved_memory_tree, tree_with_reg};
use dmamem::{
    DmaMemDriver, DriverConfig, InMemoryRegistry, InitError, IoError, LifecycleState, MapError,
    RegistrationStep, RegistryError,
};
use dmamem_addresses::{PhysicalAddress, VirtualAddress};
use dmamem_alloc::{CoherentAllocError, DIRECT_MAP_BASE, ReservedPoolAllocator};
use dmamem_topology::DeviceTree;
use dmamem_vmem::{SimulatedRam, SoftAddressSpace};
use std::sync::atomic::Ordering;

#[test]
fn probe_publishes_the_region() {
    let (dt, dev) = reserved_memory_tree();
    let mut d = driver();
    assert!(d.matches(&dt.node(dev)));

    d.probe(&dt.node(dev)).unwrap();
    assert_eq!(d.state(), LifecycleState::Published);
    assert!(d.registry().is_published("dmamem"));
    assert_eq!(d.registry().published_nodes(), ["/dev/dmamem"]);
    assert_eq!(d.registry().class_names(), ["dmamem_class"]);

    let region = d.region().unwrap();
    assert_eq!(region.size(), POOL_SIZE);
    assert_eq!(region.physical_base(), PhysicalAddress::new(POOL_BASE));
    assert_eq!(
        region.virtual_base(),
        VirtualAddress::new(DIRECT_MAP_BASE + POOL_BASE)
    );
}

#[test]
fn missing_reference_never_publishes() {
    let mut dt = DeviceTree::new();
    let dev = dt.add_child(dt.root_id(), "reserved-driver@0");
    dt.set_strings(dev, "compatible", &["dmamem"]);

    let mut d = driver();
    assert_eq!(
        d.initialize(&dt.node(dev)),
        Err(InitError::MissingReference {
            property: "memory-region"
        })
    );
    assert_eq!(d.state(), LifecycleState::Failed);
    assert!(d.region().is_none());
    assert!(d.registry().is_empty());
    assert!(!d.allocator().is_bound());

    let ram = SimulatedRam::new();
    let mut space = SoftAddressSpace::new(&ram);
    assert_eq!(d.map_memory(&mut space, 0x1000), Err(MapError::NotReady));
    let mut pos = 0;
    assert_eq!(
        d.read(&space, VirtualAddress::new(0x7000_0000_0000), 16, &mut pos),
        Err(IoError::NotReady)
    );
    assert_eq!(space.mapped_pages(), 0);
}

#[test]
fn dangling_reference_is_a_missing_reference() {
    let (mut dt, dev) = reserved_memory_tree();
    dt.set_cells(dev, "memory-region", &[0x99]);
    let mut d = driver();
    assert!(matches!(
        d.initialize(&dt.node(dev)),
        Err(InitError::MissingReference { .. })
    ));
}

#[test]
fn short_size_property_is_malformed() {
    let (dt, dev) = tree_with_reg(&[0x0, 0x8000_0000, 0x0]);
    let mut d = driver();
    assert_eq!(
        d.initialize(&dt.node(dev)),
        Err(InitError::MalformedDescriptor {
            property: "reg",
            index: 1
        })
    );
    assert!(d.registry().is_empty());
}

#[test]
fn zero_sized_region_is_refused() {
    let (dt, dev) = tree_with_reg(&[0x0, 0x8000_0000, 0x0, 0x0]);
    let mut d = driver();
    assert_eq!(d.initialize(&dt.node(dev)), Err(InitError::ZeroSizedRegion));
    assert!(d.registry().is_empty());
}

#[test]
fn each_registration_failure_is_specific_and_clean() {
    let (dt, dev) = reserved_memory_tree();
    for (step, expected) in [
        (RegistrationStep::DeviceNumbers, RegistryError::DeviceNumbers),
        (RegistrationStep::CharDevice, RegistryError::CharDevice),
        (RegistrationStep::Class, RegistryError::Class),
        (RegistrationStep::Device, RegistryError::Device),
    ] {
        let mut d = DmaMemDriver::new(
            DriverConfig::default(),
            InMemoryRegistry::failing_at(step),
            CountingAllocator::default(),
        );
        assert_eq!(
            d.initialize(&dt.node(dev)),
            Err(InitError::RegistrationFailed(expected))
        );
        assert!(d.registry().is_empty());
        // Registration comes first: the pool is never touched.
        assert_eq!(d.allocator().binds.load(Ordering::SeqCst), 0);
    }
}

#[test]
fn publish_failure_rolls_back_the_allocation() {
    let (dt, dev) = reserved_memory_tree();
    let mut d = DmaMemDriver::new(
        DriverConfig::default(),
        InMemoryRegistry::failing_at(RegistrationStep::Publish),
        CountingAllocator::default(),
    );

    assert_eq!(
        d.initialize(&dt.node(dev)),
        Err(InitError::RegistrationFailed(RegistryError::Publish))
    );
    assert_eq!(d.state(), LifecycleState::Failed);
    assert!(d.registry().is_empty());
    assert_eq!(d.allocator().inner.allocated_bytes(), 0);
    assert!(!d.allocator().inner.is_bound());
    assert_eq!(d.allocator().releases.load(Ordering::SeqCst), 1);
}

#[test]
fn exhausted_allocator_unbinds_and_unregisters() {
    let (dt, dev) = reserved_memory_tree();
    let mut d = DmaMemDriver::new(
        DriverConfig::default(),
        InMemoryRegistry::new(),
        CountingAllocator::exhausted(),
    );
    assert_eq!(
        d.initialize(&dt.node(dev)),
        Err(InitError::ResourceExhausted(CoherentAllocError::OutOfMemory(
            POOL_SIZE
        )))
    );
    assert!(d.registry().is_empty());
    assert_eq!(d.allocator().binds.load(Ordering::SeqCst), 1);
    assert_eq!(d.allocator().releases.load(Ordering::SeqCst), 1);
}

#[test]
fn region_beyond_the_dma_mask_is_exhausted() {
    let (dt, dev) = tree_with_reg(&[0x1, 0x0, 0x0, 0x10_0000]);
    let mut d = driver();
    assert!(matches!(
        d.initialize(&dt.node(dev)),
        Err(InitError::ResourceExhausted(
            CoherentAllocError::MaskViolation { .. }
        ))
    ));

    let mut wide = DmaMemDriver::new(
        DriverConfig::default().with_dma_mask_bits(40),
        InMemoryRegistry::new(),
        ReservedPoolAllocator::default(),
    );
    wide.initialize(&dt.node(dev)).unwrap();
    assert_eq!(
        wide.region().unwrap().physical_base(),
        PhysicalAddress::new(0x1_0000_0000)
    );
}

#[test]
fn second_initialize_is_refused() {
    let (dt, dev) = reserved_memory_tree();
    let mut d = driver();
    d.initialize(&dt.node(dev)).unwrap();
    assert_eq!(
        d.initialize(&dt.node(dev)),
        Err(InitError::InvalidState(LifecycleState::Published))
    );
    assert_eq!(d.state(), LifecycleState::Published);
}

#[test]
fn failed_instances_stay_failed() {
    let (dt, dev) = tree_with_reg(&[0x0, 0x8000_0000, 0x0, 0x0]);
    let mut d = driver();
    assert!(d.initialize(&dt.node(dev)).is_err());

    let (good, good_dev) = reserved_memory_tree();
    assert_eq!(
        d.initialize(&good.node(good_dev)),
        Err(InitError::InvalidState(LifecycleState::Failed))
    );
}

#[test]
fn teardown_releases_everything_and_allows_reinitialization() {
    let (dt, dev) = reserved_memory_tree();
    let mut d = driver();
    d.probe(&dt.node(dev)).unwrap();

    d.remove();
    assert_eq!(d.state(), LifecycleState::TornDown);
    assert!(d.region().is_none());
    assert!(d.registry().is_empty());
    assert!(!d.allocator().is_bound());

    let ram = SimulatedRam::new();
    let mut space = SoftAddressSpace::new(&ram);
    assert_eq!(d.map_memory(&mut space, 0x1000), Err(MapError::NotReady));

    d.initialize(&dt.node(dev)).unwrap();
    assert_eq!(d.region().unwrap().size(), POOL_SIZE);
    assert!(d.map_memory(&mut space, 0x1000).is_ok());
}

#[test]
fn teardown_before_initialize_is_a_no_op() {
    let mut d = driver();
    d.teardown();
    assert_eq!(d.state(), LifecycleState::Uninitialized);
}
