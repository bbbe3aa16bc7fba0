use crate::{DriverConfig, InitError};
use dmamem_topology::{CellPairDecoder, Node};
use log::error;

/// The node backing a device and the region size read from it.
#[derive(Debug, Copy, Clone)]
pub struct ResolvedRegion<'t> {
    pub node: Node<'t>,
    pub size: u64,
}

/// Follows a device node's region reference and reads the region size.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RegionDescriptorResolver {
    region_property: &'static str,
    size_property: &'static str,
    size_index: usize,
}

impl RegionDescriptorResolver {
    #[must_use]
    pub const fn new(config: &DriverConfig) -> Self {
        Self {
            region_property: config.region_property,
            size_property: config.size_property,
            size_index: config.size_index,
        }
    }

    /// Resolve the region referenced by `device`.
    ///
    /// # Errors
    /// - [`InitError::MissingReference`] if the reference is absent or dangling.
    /// - [`InitError::MalformedDescriptor`] if the size cells are absent or short.
    pub fn resolve<'t>(&self, device: &Node<'t>) -> Result<ResolvedRegion<'t>, InitError> {
        let node = device
            .parse_phandle(self.region_property, 0)
            .map_err(|e| {
                error!("Failed to find memory-region: {e}");
                InitError::MissingReference {
                    property: self.region_property,
                }
            })?;

        let size = CellPairDecoder::read_u64(&node, self.size_property, self.size_index)
            .map_err(|e| {
                error!("Failed to read reserved memory size: {e}");
                InitError::MalformedDescriptor {
                    property: self.size_property,
                    index: self.size_index,
                }
            })?;

        Ok(ResolvedRegion { node, size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmamem_topology::DeviceTree;

    #[test]
    fn reads_the_size_pair_of_the_referenced_node() {
        let mut dt = DeviceTree::new();
        let bank = dt.add_child(dt.root_id(), "bank0@0");
        dt.set_phandle(bank, 7);
        dt.set_cells(bank, "reg", &[0x0, 0x8000_0000, 0x1, 0x0000_0004]);
        let dev = dt.add_child(dt.root_id(), "dev");
        dt.set_cells(dev, "memory-region", &[7]);

        let r = RegionDescriptorResolver::new(&DriverConfig::new())
            .resolve(&dt.node(dev))
            .unwrap();
        assert_eq!(r.node.id(), bank);
        assert_eq!(r.size, 0x1_0000_0004);
    }

    #[test]
    fn custom_index_selects_another_pair() {
        let mut dt = DeviceTree::new();
        let bank = dt.add_child(dt.root_id(), "bank0@0");
        dt.set_phandle(bank, 7);
        dt.set_cells(bank, "sizes", &[0, 1, 0, 2, 0, 3]);
        let dev = dt.add_child(dt.root_id(), "dev");
        dt.set_cells(dev, "memory-region", &[7]);

        let config = DriverConfig::new().with_size_property("sizes").with_size_index(2);
        let r = RegionDescriptorResolver::new(&config)
            .resolve(&dt.node(dev))
            .unwrap();
        assert_eq!(r.size, 3);
    }
}
