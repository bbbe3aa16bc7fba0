use dmamem_addresses::{PhysicalAddress, PhysicalFrame, Size4K, VirtualAddress};
use dmamem_vmem::{
    CachePolicy, PageEntryBits, PhysicalMemory, RemapError, SimulatedRam, SoftAddressSpace,
    UserAddressSpace, UserFault,
};

const POOL: u64 = 0x8000_0000;

fn frame(pa: u64) -> PhysicalFrame<Size4K> {
    PhysicalFrame::containing(PhysicalAddress::new(pa))
}

#[test]
fn mapped_range_aliases_physical_memory() {
    let ram = SimulatedRam::new();
    let mut space = SoftAddressSpace::new(&ram);
    let va = space.get_unmapped_area(0x2000).unwrap();

    space
        .remap_pfn_range(
            va,
            frame(POOL),
            0x2000,
            PageEntryBits::user_io(CachePolicy::WriteCombining),
        )
        .unwrap();
    assert_eq!(space.mapped_pages(), 2);

    // Store through the mapping, observe it in RAM.
    space.write(va + 0xFFE, b"dmam").unwrap();
    let mut raw = [0u8; 4];
    ram.read(PhysicalAddress::new(POOL + 0xFFE), &mut raw);
    assert_eq!(&raw, b"dmam");

    // Store in RAM, observe it through the mapping.
    ram.write(PhysicalAddress::new(POOL + 0x1800), b"xyz");
    let mut seen = [0u8; 3];
    space.read(va + 0x1800, &mut seen).unwrap();
    assert_eq!(&seen, b"xyz");

    assert_eq!(
        space.translate(va + 0x1234),
        Some(PhysicalAddress::new(POOL + 0x1234))
    );
}

#[test]
fn entries_carry_requested_policy() {
    let ram = SimulatedRam::new();
    let mut space = SoftAddressSpace::new(&ram);
    let va = VirtualAddress::new(0x7000_0000_0000);
    space
        .remap_pfn_range(
            va,
            frame(POOL),
            0x1000,
            PageEntryBits::user_io(CachePolicy::Uncached),
        )
        .unwrap();

    let e = space.entry(va).unwrap();
    assert_eq!(e.cache_policy(), Some(CachePolicy::Uncached));
    assert!(e.pfn_map());
    assert_eq!(e.frame(), frame(POOL));
}

#[test]
fn overlapping_request_installs_nothing() {
    let ram = SimulatedRam::new();
    let mut space = SoftAddressSpace::new(&ram);
    let flags = PageEntryBits::user_io(CachePolicy::WriteCombining);
    let base = VirtualAddress::new(0x7000_0000_0000);

    space
        .remap_pfn_range(base + 0x3000, frame(POOL), 0x1000, flags)
        .unwrap();

    let err = space
        .remap_pfn_range(base, frame(POOL), 0x4000, flags)
        .unwrap_err();
    assert_eq!(err, RemapError::Overlap(base + 0x3000));
    assert_eq!(space.mapped_pages(), 1);
    assert!(space.entry(base).is_none());
}

#[test]
fn rejects_unaligned_out_of_range_and_sealed() {
    let ram = SimulatedRam::new();
    let mut space = SoftAddressSpace::new(&ram);
    let flags = PageEntryBits::user_io(CachePolicy::WriteCombining);

    let va = VirtualAddress::new(0x7000_0000_0010);
    assert_eq!(
        space.remap_pfn_range(va, frame(POOL), 0x1000, flags),
        Err(RemapError::Unaligned(va))
    );

    let near_end = VirtualAddress::new(0x0000_7FFF_FFFF_F000);
    assert_eq!(
        space.remap_pfn_range(near_end, frame(POOL), 0x2000, flags),
        Err(RemapError::OutOfRange)
    );

    space.seal();
    assert_eq!(
        space.remap_pfn_range(VirtualAddress::new(0x7000_0000_0000), frame(POOL), 0x1000, flags),
        Err(RemapError::PermissionDenied)
    );
    assert_eq!(space.mapped_pages(), 0);
}

#[test]
fn unmapped_area_skips_existing_mappings() {
    let ram = SimulatedRam::new();
    let mut space = SoftAddressSpace::new(&ram);
    let flags = PageEntryBits::user_io(CachePolicy::WriteCombining);

    let first = space.get_unmapped_area(0x1000).unwrap();
    space.remap_pfn_range(first, frame(POOL), 0x1000, flags).unwrap();

    let second = space.get_unmapped_area(0x1000).unwrap();
    assert_eq!(second, first + 0x1000);
}

#[test]
fn access_outside_mapping_faults() {
    let ram = SimulatedRam::new();
    let mut space = SoftAddressSpace::new(&ram);
    let va = VirtualAddress::new(0x7000_0000_0000);
    space
        .remap_pfn_range(
            va,
            frame(POOL),
            0x1000,
            PageEntryBits::user_io(CachePolicy::WriteCombining),
        )
        .unwrap();

    let mut buf = [0u8; 8];
    assert_eq!(
        space.read(va + 0xFFC, &mut buf),
        Err(UserFault(va + 0x1000))
    );

    space.unmap(va, 0x1000);
    assert_eq!(space.write(va, b"x"), Err(UserFault(va)));
}
