use dmamem_alloc::DmaMask;
use dmamem_setters_derive::Setters;
use dmamem_vmem::CachePolicy;

/// Names, topology property layout and mapping policy of one driver instance.
///
/// The defaults describe the classic binding:
///
/// ```text
/// reserved-driver@0 {
///     compatible = "dmamem";
///     memory-region = <&bank0>;      // region_property
/// };
/// bank0@0 {
///     reg = <0x0 base 0x0 size>;     // size_property, pair index size_index
/// };
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Setters)]
pub struct DriverConfig {
    /// Name of the character device and its `/dev` node.
    pub device_name: &'static str,
    /// Name of the device class the node is created under.
    pub class_name: &'static str,
    /// `compatible` string the driver binds to.
    pub compatible: &'static str,
    /// Phandle property on the device node pointing at the reserved region.
    pub region_property: &'static str,
    /// Cell-pair property on the region node holding `{address, size}`.
    pub size_property: &'static str,
    /// Pair index of the size within [`size_property`](Self::size_property).
    pub size_index: usize,
    /// Physical address lines the device can drive.
    pub dma_mask_bits: u32,
    /// Memory type of user mappings.
    pub cache_policy: CachePolicy,
}

impl DriverConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            device_name: "dmamem",
            class_name: "dmamem_class",
            compatible: "dmamem",
            region_property: "memory-region",
            size_property: "reg",
            size_index: 1,
            dma_mask_bits: 32,
            cache_policy: CachePolicy::WriteCombining,
        }
    }

    #[must_use]
    pub const fn dma_mask(&self) -> DmaMask {
        DmaMask::bits(self.dma_mask_bits)
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::new()
    }
}
